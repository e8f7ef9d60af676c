//! cssom-fmt - parse a stylesheet and write it back in canonical form
//!
//! Usage: cssom-fmt [-o <out.css>] [--indent <prefix>] <in.css | ->

use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{bail, Context, Result};
use fos_cssom::{PropertyId, Stylesheet, WriteOptions};
use tracing_subscriber::EnvFilter;

struct Args {
    input: String,
    output: Option<String>,
    indent: String,
}

fn parse_args() -> Result<Option<Args>> {
    let mut input = None;
    let mut output = None;
    let mut indent = String::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-o" | "--out-file" => {
                output = Some(args.next().context("missing file name after -o")?);
            }
            "--indent" => {
                indent = args.next().context("missing prefix after --indent")?;
            }
            _ if input.is_none() => input = Some(arg),
            _ => bail!("unexpected argument: {}", arg),
        }
    }

    let Some(input) = input else {
        bail!("no input file given");
    };
    Ok(Some(Args { input, output, indent }))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        println!("Parses a CSS file and writes it back in canonical form.");
        println!("Usage: cssom-fmt [-o <out.css>] [--indent <prefix>] <in.css | ->");
        return Ok(());
    };

    // Every property name is accepted and gets the next free id
    let mut names: Vec<String> = Vec::new();
    let name_to_id = |name: &str| {
        let index = match names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                names.push(name.to_string());
                names.len() - 1
            }
        };
        Some(PropertyId(index as u32))
    };

    let sheet: Stylesheet<String> = if args.input == "-" {
        Stylesheet::read(io::stdin().lock(), name_to_id, |_, value| Some(value))
    } else {
        let file = File::open(&args.input).with_context(|| format!("opening {}", args.input))?;
        Stylesheet::read(file, name_to_id, |_, value| Some(value))
    }
    .with_context(|| format!("parsing {}", args.input))?;

    tracing::info!("Read {} styles with {} distinct properties", sheet.len(), names.len());

    let options = WriteOptions::with_indent(args.indent);
    let id_to_name = |id: PropertyId| names.get(id.0 as usize).cloned();
    let value_to_string = |_: PropertyId, value: &String| value.clone();

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            sheet.write_to(BufWriter::new(file), &options, id_to_name, value_to_string)?;
        }
        None => sheet.write_to(io::stdout().lock(), &options, id_to_name, value_to_string)?,
    }

    Ok(())
}
