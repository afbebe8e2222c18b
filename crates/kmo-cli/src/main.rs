use clap::Parser;
use kmo::{Cli, run};

fn main() {
    // `kmo compose ... | head` must exit quietly
    #[cfg(unix)]
    restore_default_sigpipe();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn restore_default_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
