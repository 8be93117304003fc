//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = locus_cli::run() {
        eprintln!("locus: {err}");
        std::process::exit(1);
    }
}
