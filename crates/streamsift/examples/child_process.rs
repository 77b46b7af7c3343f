//! Runs a child process and turns its stdout into records as it prints.
//!
//! The child mixes JSON log records, plain text and a tendermint style block
//! dump. Its stdout is copied into a [`Filter`] and every record is printed
//! as one line of JSON.
//!
//! Run with
//!
//! ```bash
//! RUST_LOG=streamsift=debug cargo run -p streamsift --example child_process
//! ```
#![allow(missing_docs)]

use std::{
    io,
    process::{Command, Stdio},
};

use streamsift::{Chain, DefaultFields, Filter, FilterOptions, Value};
use tracing_subscriber::EnvFilter;

const SCRIPT: &str = r#"
echo 'starting node'
printf '%s\n' '{"level":"info","module":"state","_msg":"Executed block","height":2}'
sleep 0.1
printf '%s' '{"level":"info","module":"consensus",'
sleep 0.1
printf '%s\n' '"_msg":"Block{\n  Height: 3\n  ChainID: localnet\n}"}'
echo 'panic: runtime error'
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(SCRIPT)
        .stdout(Stdio::piped())
        .spawn()?;
    let mut stdout = child.stdout.take().ok_or("child has no stdout")?;

    let chain = Chain::json().with(DefaultFields::new([("source", "node")]));
    let mut filter = Filter::json(
        |fields| println!("{}", Value::Object(fields)),
        chain,
        FilterOptions {
            source: "node".into(),
            ..Default::default()
        },
        None,
    )?;

    io::copy(&mut stdout, &mut filter)?;
    let status = child.wait()?;
    filter.join().map_err(|_| "filter worker panicked")?;
    tracing::info!(%status, "child exited");
    Ok(())
}
