use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::ConvertArgs;

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let input_path = PathBuf::from(&args.input);
    let text = crate::store::read_file(&input_path)?;

    tracing::info!(input = %input_path.display(), "converting to markdown");
    let markdown = crate::markup::translate(&text);

    match args.out {
        Some(out) => {
            let out_path = PathBuf::from(out);
            crate::store::write_file(&out_path, &markdown)?;
            tracing::info!(out = %out_path.display(), "saved");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(markdown.as_bytes())
                .context("write markdown to stdout")?;
            stdout.flush().context("flush stdout")?;
        }
    }

    Ok(())
}
