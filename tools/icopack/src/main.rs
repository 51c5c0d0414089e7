use clap::Parser;

use log::{
	info,
	LevelFilter
};

use std::{
	error::Error,
	fs,
	io::Write,
	path::PathBuf,
	process::ExitCode
};

use iconkit_icopack::{
	DEFAULT_SIZES,
	pack,
	PackError,
	parse_sizes
};

#[derive(Parser)]
#[command(name = "icopack")]
#[command(about = "Pack a PNG image into a multi-size Windows icon", long_about = None)]
struct Args {
	/// Input PNG file
	#[arg(short, long, value_name = "PNG")]
	input: PathBuf,

	/// Output icon file
	#[arg(short, long, value_name = "ICO")]
	output: PathBuf,

	/// Comma-separated icon sizes (maximum is 256)
	#[arg(short, long, default_value = DEFAULT_SIZES)]
	sizes: String,

	/// Log every directory entry
	#[arg(short, long)]
	verbose: bool,
}

fn init_logging(verbose: bool) {
	let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
		.init();
}

fn run(args: &Args) -> Result<(), PackError> {
	let sizes = parse_sizes(&args.sizes)?;
	let ico = pack(&args.input, &sizes)?;

	fs::write(&args.output, &ico)?;
	info!("Wrote {} ({} bytes)", args.output.display(), ico.len());

	Ok(())
}

/// `--help` and `--version` also come back as parse errors but are not failures
fn is_usage_error(err: &clap::Error) -> bool {
	err.use_stderr()
}

/// Joins an error with all of its sources
fn report(err: &dyn Error) -> String {
	let mut msg = err.to_string();
	let mut source = err.source();

	while let Some(cause) = source {
		msg.push_str(": ");
		msg.push_str(&cause.to_string());
		source = cause.source();
	}

	msg
}

fn main() -> ExitCode {
	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(e) => {
			let _ = e.print();
			return if is_usage_error(&e) { ExitCode::FAILURE } else { ExitCode::SUCCESS };
		},
	};
	init_logging(args.verbose);

	match run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Error: {}", report(&e));
			ExitCode::FAILURE
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_arguments_fail() {
		let err = Args::try_parse_from(["icopack", "-i", "in.png"]).err().unwrap();
		assert!(is_usage_error(&err));

		let err = Args::try_parse_from(["icopack", "-o", "out.ico"]).err().unwrap();
		assert!(is_usage_error(&err));
	}

	#[test]
	fn test_help_is_not_a_failure() {
		let err = Args::try_parse_from(["icopack", "--help"]).err().unwrap();
		assert!(!is_usage_error(&err));
	}

	#[test]
	fn test_default_sizes() {
		let args = Args::try_parse_from(["icopack", "-i", "in.png", "-o", "out.ico"]).unwrap();
		assert_eq!(DEFAULT_SIZES, args.sizes);
		assert!(!args.verbose);
	}
}
