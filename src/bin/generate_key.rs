//! CLI tool to generate function and system keys.
//!
//! Usage:
//!   cargo run --bin generate-key -- --name ci-deploy

use std::env;

use funcgate::secrets::{fingerprint, generate_key};

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let mut name: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" | "-n" => {
                i += 1;
                if i < args.len() {
                    name = Some(args[i].clone());
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    // Validate required arguments
    let name = match name {
        Some(n) => n,
        None => {
            eprintln!("Error: --name is required");
            print_usage();
            std::process::exit(1);
        }
    };

    let key = generate_key();

    // Output
    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("  Key Generated");
    println!("════════════════════════════════════════════════════════════════");
    println!();
    println!("  Name:        {}", name);
    println!("  Fingerprint: {}", fingerprint(&key));
    println!();
    println!("  Key:         {}", key);
    println!();
    println!("  Add it under this name to host.json (systemKeys) or to the");
    println!("  function's key file, then discard this output.");
    println!("  ⚠️  Save this key! It cannot be retrieved later.");
    println!("════════════════════════════════════════════════════════════════");
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: generate-key --name <name>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --name, -n        Name for the key (required)");
    eprintln!("  --help, -h        Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  generate-key --name ci-deploy");
    eprintln!("  generate-key --name swagger-ui");
    eprintln!();
}
