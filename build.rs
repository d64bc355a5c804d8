// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn server_cli() -> Command {
    Command::new("rmadison-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Debian archive metadata indexer and lookup service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (defaults to the standard search path)"),
        )
}

fn client_cli() -> Command {
    Command::new("rmadison")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Query package publications from an rmadison server")
        .arg(Arg::new("package").required(true).help("Binary package name to look up"))
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .default_value("http://localhost:8433")
                .help("Server to query"),
        )
}

fn render_man(cmd: Command, man_dir: &PathBuf, file_name: &str) {
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join(file_name);
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    render_man(server_cli(), &man_dir, "rmadison-server.1");
    render_man(client_cli(), &man_dir, "rmadison.1");
}
