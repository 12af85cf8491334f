//! Renders the `slackhook(1)` man page to the given path, or to stdout.

use std::io::Write;

use anyhow::Context;
use clap::CommandFactory;
use clap_mangen::Man;
use slackhook::cli::Cli;

fn main() -> anyhow::Result<()> {
    let mut page = Vec::new();
    Man::new(Cli::command().name("slackhook"))
        .render(&mut page)
        .context("Rendering man page")?;

    match std::env::args().nth(1) {
        Some(out) => {
            std::fs::write(&out, &page).with_context(|| format!("Writing {out}"))?;
            eprintln!("Wrote slackhook(1) to {out}");
        }
        None => std::io::stdout().write_all(&page)?,
    }
    Ok(())
}
