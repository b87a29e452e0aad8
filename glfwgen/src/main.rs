////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{env, fs, path::PathBuf, process};

use anyhow::{Context, Result};
use glfw_generator::{BindingsGenerator, DirCorpus, DirectorySink, GenContext, ModelProvider};
use log::info;

const USAGE: &str = "usage: glfwgen <glfw-checkout> <output-dir> <license-file> <doc-base-url>";

#[derive(Debug, PartialEq)]
struct GeneratorArgs {
    /// GLFW source checkout; the reference is read from `docs/html` inside it.
    glfw: PathBuf,
    output: PathBuf,
    license: PathBuf,
    doc_url: String,
}

impl GeneratorArgs {
    fn parse(args: &[String]) -> Option<GeneratorArgs> {
        match args {
            [glfw, output, license, doc_url] => Some(GeneratorArgs {
                glfw: PathBuf::from(glfw),
                output: PathBuf::from(output),
                license: PathBuf::from(license),
                doc_url: doc_url.clone(),
            }),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match GeneratorArgs::parse(&args) {
        Some(args) => args,
        None => {
            eprintln!("{}", USAGE);
            process::exit(1);
        },
    };

    run(args)
}

/// Reads the license, wipes the output directory, scrapes the reference and writes the bindings.
fn run(args: GeneratorArgs) -> Result<()> {
    let GeneratorArgs {
        glfw,
        output,
        license,
        doc_url,
    } = args;

    let license =
        fs::read_to_string(&license).with_context(|| format!("failed to read license file {}", license.display()))?;
    let mut sink = DirectorySink::create(&output)
        .with_context(|| format!("failed to prepare output directory {}", output.display()))?;

    let corpus = DirCorpus::from_checkout(&glfw);
    info!("Reading the GLFW reference from {}", corpus.root().display());
    let api = ModelProvider::new(corpus).get_api().context("failed to scrape the GLFW reference")?;

    api.write_bindings(BindingsGenerator, &GenContext::new(doc_url, license), &mut sink)
        .with_context(|| format!("failed to write bindings to {}", output.display()))?;

    info!(
        "Generated {} functions, {} typedefs and {} enums into {}",
        api.functions.len(),
        api.type_defs.len(),
        api.macro_collections.len(),
        output.display()
    );
    Ok(())
}
