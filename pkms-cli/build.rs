//! Build script for pkms-cli.
//!
//! This script generates the man page at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! structure is declared here as well.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs.
fn build_cli() -> Command {
    Command::new("pkms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve pkms references and file locations")
        .long_about(
            "Command-line tool for resolving logical pkms references against the index \
             and converting between location URIs and filesystem paths",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("workspace-dir")
                .long("workspace-dir")
                .help("Override the workspace directory location")
                .value_name("PATH")
                .global(true)
                .env("PKMS_WORKSPACE_DIR"),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the index busy timeout (in milliseconds)")
                .value_name("MILLIS")
                .global(true),
        )
        .subcommands(vec![
            Command::new("resolve")
                .about("Resolve a logical reference against the index")
                .long_about(
                    "Resolve a pkms:///file/<selector>:<value>.<ext> reference and print \
                     the graded outcome",
                ),
            Command::new("parse-location")
                .about("Parse a location URI and print its structure")
                .long_about("Print the scheme, authority and path segments of a location URI"),
            Command::new("project")
                .about("Project a location URI onto a filesystem path (or back)")
                .long_about("Convert a file location to a POSIX or Windows path, or import a path"),
            Command::new("init")
                .about("Initialize the workspace and index database")
                .long_about("Create the pkms workspace directory and an empty index database"),
            Command::new("show-workspace")
                .about("Show the resolved workspace directory")
                .long_about("Display the workspace directory or the index database path"),
            Command::new("validate")
                .about("Validate a configuration file")
                .long_about("Check a pkms configuration file for errors"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("pkms.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
