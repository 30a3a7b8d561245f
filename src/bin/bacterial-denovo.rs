//! Run the published "W3 - Bacterial de novo assembly | Paired-end" workflow
//! on the E. coli MiSeq reads from the "Orione SupMat" library.

use galaxy_objects::cli_config::{self, CliConfig};
use galaxy_objects::{
    get_one, logging, Entity, GalaxyError, GalaxyInstance, HistoryTarget, InputsBy, Result,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::env;
use std::process;
use tracing::{debug, warn};

const DEFAULT_URL: &str = "https://orione.crs4.it";
const WORKFLOW_NAME: &str = "W3 - Bacterial de novo assembly | Paired-end";
const LIBRARY_NAME: &str = "Orione SupMat";
const DATASETS: [(&str, &str); 2] = [
    (
        "/Whole genome - Escherichia coli/E coli DH10B MiSeq R1.fastq",
        "Left/Forward FASTQ Reads",
    ),
    (
        "/Whole genome - Escherichia coli/E coli DH10B MiSeq R2.fastq",
        "Right/Reverse FASTQ Reads",
    ),
];
const HASH_LENGTHS: [&str; 3] = ["19", "23", "29"];

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

struct Args {
    server: Option<String>,
    debug: bool,
}

fn run() -> Result<()> {
    let args = parse_args();

    let (mut config, config_path, path_error) = match cli_config::config_file_path() {
        Ok(path) => (cli_config::load_config(&path)?, Some(path), None),
        Err(err) => (CliConfig::default(), None, Some(err)),
    };

    if let Some(url) = &args.server {
        config.galaxy_url = Some(url.clone());
        if let Some(path) = &config_path {
            if let Err(err) = cli_config::save_config(path, &config) {
                eprintln!("Warning: failed to update {}: {}", path.display(), err);
            }
        }
    }

    let mut config = config.with_env_overrides();
    if config.galaxy_url.is_none() {
        config.galaxy_url = Some(DEFAULT_URL.to_string());
    }
    logging::init(args.debug || config.debug());
    match (&config_path, path_error) {
        (Some(path), _) => debug!(path = %path.display(), "loaded config"),
        (None, Some(err)) => warn!("{}; using environment and defaults only", err),
        (None, None) => {}
    }

    let gi = GalaxyInstance::from_config(&config)?;
    let (workflow_id, history) = run_assembly(&gi)?;

    println!("Running workflow: {} [{}]", WORKFLOW_NAME, workflow_id);
    println!(
        "Output history: {} [{}]",
        history.name().unwrap_or_default(),
        history.id().unwrap_or_default()
    );
    Ok(())
}

fn run_assembly(gi: &GalaxyInstance) -> Result<(String, galaxy_objects::History)> {
    let previews = gi.workflows().get_previews(Some(WORKFLOW_NAME), true)?;
    let preview = get_one(previews.iter().filter(|p| p.published()))?;
    let preview_id = preview
        .id()
        .ok_or(GalaxyError::MissingId { what: "workflow preview" })?;
    let workflow = gi.workflows().import_shared(&preview_id)?;

    let history_name = format!("{} output", WORKFLOW_NAME);
    let history = gi.histories().create(Some(&history_name))?;

    let library = get_one(gi.libraries().list(Some(LIBRARY_NAME), false)?)?;
    let mut inputs = BTreeMap::new();
    for (path, label) in DATASETS {
        let source = get_one(library.datasets(Some(path)))?;
        let imported = gi.histories().import_dataset(&history, &source)?;
        let input = imported
            .to_input()
            .ok_or(GalaxyError::MissingId { what: "history dataset" })?;
        inputs.insert(label.to_string(), input);
    }

    let params = assembly_params(&workflow)?;
    let invocation = workflow.invoke(
        gi,
        &inputs,
        &params,
        HistoryTarget::Existing(history.id().unwrap_or_default()),
        InputsBy::Name,
    )?;

    let out_history = match invocation.history_id() {
        Some(id) => gi.histories().get(id)?,
        None => history,
    };
    let workflow_id = workflow
        .id()
        .ok_or(GalaxyError::MissingId { what: "workflow" })?;
    Ok((workflow_id, out_history))
}

/// Per-step `hash_length` for the velveth steps, a shared `ins_length`
/// for velvetg, and the fixed genome-size settings.
fn assembly_params(workflow: &galaxy_objects::Workflow) -> Result<galaxy_objects::Document> {
    let mut params = galaxy_objects::Document::new();

    let velveth = workflow
        .tool_labels_to_ids()
        .get("velveth")
        .ok_or_else(|| GalaxyError::not_found("Workflow", "velveth"))?;
    if velveth.len() != HASH_LENGTHS.len() {
        return Err(GalaxyError::document(format!(
            "expected {} velveth steps, found {}",
            HASH_LENGTHS.len(),
            velveth.len()
        )));
    }
    for (id, length) in velveth.iter().zip(HASH_LENGTHS) {
        params.insert(id.to_string(), json!({ "hash_length": length }));
    }

    let velvetg = workflow
        .tool_labels_to_ids()
        .get("velvetg")
        .and_then(|ids| ids.iter().next())
        .and_then(|id| workflow.step(*id))
        .and_then(|step| step.tool())
        .ok_or_else(|| GalaxyError::not_found("Workflow", "velvetg"))?;
    // API-format tool_inputs keep nested parameters as JSON text.
    let mut reads = match velvetg.param("reads")? {
        Value::String(text) => serde_json::from_str::<Value>(text)?,
        other => other.clone(),
    };
    match reads.as_object_mut() {
        Some(reads) => {
            reads.insert("ins_length".to_string(), json!(-1));
        }
        None => {
            return Err(GalaxyError::document(
                "velvetg parameter 'reads' is not an object",
            ))
        }
    }
    params.insert("velvetg".to_string(), json!({ "reads": reads }));

    params.insert("cisarunner".to_string(), json!({"genomesize": 5000000}));
    params.insert("check_contigs".to_string(), json!({"genomesize": 5.0}));
    params.insert(
        "toolshed.g2.bx.psu.edu/repos/edward-kirton/abyss_toolsuite/abyss/1.0.0".to_string(),
        json!({"k": 41}),
    );
    Ok(params)
}

fn parse_args() -> Args {
    let mut args = env::args().skip(1);
    let mut server = None;
    let mut debug = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => match args.next() {
                Some(url) => server = Some(url),
                None => usage_and_exit("--server requires a URL"),
            },
            "--debug" => debug = true,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other if other.starts_with("--server=") => {
                server = Some(other["--server=".len()..].to_string());
            }
            other => usage_and_exit(&format!("unexpected argument: {}", other)),
        }
    }

    Args { server, debug }
}

fn usage_and_exit(message: &str) -> ! {
    eprintln!("error: {}", message);
    print_usage();
    process::exit(2);
}

fn print_usage() {
    eprintln!(
        "Usage: bacterial-denovo [--server URL] [--debug]\n\n\
         Imports the published '{}' workflow, loads the MiSeq reads from the\n\
         '{}' library into a new history and invokes the workflow.\n\n\
         The API key is read from GALAXY_API_KEY or API_KEY in ~/.galaxy-objects.",
        WORKFLOW_NAME, LIBRARY_NAME
    );
}
