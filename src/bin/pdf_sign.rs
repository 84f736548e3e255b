//! Sign or verify PDFs from the command line.
//!
//! Usage:
//!   pdf-sign sign --input in.pdf --output out.pdf --p12 signer.p12 [--passphrase PASS]
//!                 [--config opts.json] [--reason R] [--location L] [--contact-info C]
//!                 [--name N] [--signature-length BYTES] [--cades]
//!   pdf-sign verify --input signed.pdf [--occurrence N]
//!
//! Set `RUST_LOG=debug` to see offsets and object numbers.

use pdf_sigil::api;
use pdf_sigil::signatures::{
    count_signatures, extract_signature, SignOptions, SignatureSubFilter, SignatureVerifier, SigningCredentials,
};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: pdf-sign sign --input IN --output OUT --p12 BUNDLE [options]\n       pdf-sign verify --input IN [--occurrence N]";

struct SignArgs {
    input: PathBuf,
    output: PathBuf,
    p12: PathBuf,
    passphrase: String,
    options: SignOptions,
}

struct VerifyArgs {
    input: PathBuf,
    occurrence: Option<usize>,
}

enum Command {
    Sign(SignArgs),
    Verify(VerifyArgs),
}

fn take_value(args: &[String], i: &mut usize) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} expects a value", args[*i - 1]))
}

fn parse_sign(args: &[String]) -> Result<SignArgs, Box<dyn std::error::Error>> {
    let mut input = None;
    let mut output = None;
    let mut p12 = None;
    let mut passphrase = String::new();
    let mut config = None;
    let mut overrides: Vec<(String, String)> = Vec::new();
    let mut cades = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "-i" => input = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--output" | "-o" => output = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--p12" => p12 = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--passphrase" => passphrase = take_value(args, &mut i)?,
            "--config" => config = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--reason" | "--location" | "--contact-info" | "--name" | "--signature-length" => {
                let flag = args[i].clone();
                overrides.push((flag, take_value(args, &mut i)?));
            },
            "--cades" => cades = true,
            other => return Err(format!("unknown option {}", other).into()),
        }
        i += 1;
    }

    // Command-line values win over the config file.
    let mut options = match config {
        Some(path) => SignOptions::from_json_file(path)?,
        None => SignOptions::default(),
    };
    for (flag, value) in overrides {
        options = match flag.as_str() {
            "--reason" => options.with_reason(value),
            "--location" => options.with_location(value),
            "--contact-info" => options.with_contact_info(value),
            "--name" => options.with_name(value),
            _ => options.with_signature_length(value.parse()?),
        };
    }
    if cades {
        options = options.with_sub_filter(SignatureSubFilter::CadesDetached);
    }

    Ok(SignArgs {
        input: input.ok_or("--input is required")?,
        output: output.ok_or("--output is required")?,
        p12: p12.ok_or("--p12 is required")?,
        passphrase,
        options,
    })
}

fn parse_verify(args: &[String]) -> Result<VerifyArgs, Box<dyn std::error::Error>> {
    let mut input = None;
    let mut occurrence = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "-i" => input = Some(PathBuf::from(take_value(args, &mut i)?)),
            "--occurrence" | "-n" => occurrence = Some(take_value(args, &mut i)?.parse()?),
            other => return Err(format!("unknown option {}", other).into()),
        }
        i += 1;
    }

    Ok(VerifyArgs {
        input: input.ok_or("--input is required")?,
        occurrence,
    })
}

fn parse_command(args: &[String]) -> Result<Command, Box<dyn std::error::Error>> {
    match args.first().map(String::as_str) {
        Some("sign") => Ok(Command::Sign(parse_sign(&args[1..])?)),
        Some("verify") => Ok(Command::Verify(parse_verify(&args[1..])?)),
        _ => Err(USAGE.into()),
    }
}

fn run_sign(args: SignArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let credentials = SigningCredentials::from_pkcs12_file(&args.p12, &args.passphrase)?;
    let pdf = std::fs::read(&args.input)?;
    let signed = api::sign_document(&pdf, &credentials, &args.options)?;
    std::fs::write(&args.output, &signed)?;
    println!(
        "Signed {} -> {} ({} bytes, signer: {})",
        args.input.display(),
        args.output.display(),
        signed.len(),
        credentials.common_name().unwrap_or_else(|| "unknown".to_string())
    );
    Ok(true)
}

fn run_verify(args: VerifyArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let pdf = std::fs::read(&args.input)?;
    let total = count_signatures(&pdf);
    if total == 0 {
        println!("{}: no signatures", args.input.display());
        return Ok(false);
    }

    let occurrences = match args.occurrence {
        Some(n) => vec![n],
        None => (1..=total).collect(),
    };

    let verifier = SignatureVerifier::new();
    let mut all_ok = true;
    for n in occurrences {
        let extracted = extract_signature(&pdf, n)?;
        let result = verifier.verify(&extracted, pdf.len())?;
        all_ok &= result.status.is_ok();
        println!(
            "Signature {}/{}: {:?}, signer {}, ByteRange {:?}{}",
            n,
            total,
            result.status,
            result.signer_common_name.as_deref().unwrap_or("unknown"),
            result.byte_range,
            if result.covers_whole_document { "" } else { " (partial)" }
        );
        for message in &result.messages {
            println!("  - {}", message);
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = parse_command(&args).and_then(|command| match command {
        Command::Sign(sign) => run_sign(sign),
        Command::Verify(verify) => run_verify(verify),
    });

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        },
    }
}
