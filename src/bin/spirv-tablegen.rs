//! Table generator driver.
//!
//! Reads grammar record text from a file argument or stdin, writes the
//! generated table source to a file argument or stdout. Errors abort with a
//! non-zero exit before any artifact bytes are written.

use std::env;
use std::fs;
use std::io::{self, Read, Write};

use bumpalo::Bump;
use spirv_tablegen::{GrammarSession, TableGenResult};

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> TableGenResult<()> {
    let args: Vec<String> = env::args().collect();

    let text = match args.get(1) {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let artifact = spirv_tablegen::compile(&text, &session)?;

    match args.get(2) {
        Some(path) => fs::write(path, &artifact)?,
        None => io::stdout().write_all(artifact.as_bytes())?,
    }

    log::debug!("{}", session.stats());
    Ok(())
}
