use std::{error::Error, fs::File, path::PathBuf};

use clap::Parser;

use trainhook::{
    extensions::{FinishAfter, Printing, ProgressBar, Timing},
    simple_extension::ConditionOptions,
    Algorithm, AlgorithmError, LogRow, MainLoop, MainLoopOptions, TrainingLog,
};

/// Run a training loop over synthetic batches to see extensions at work. Each batch is a list of integers, and the "algorithm" just sums them.
#[derive(Parser, Debug, Clone)]
struct Cli {
    /// number of batches per epoch
    #[arg(short = 'b', long, default_value = "10")]
    batches: usize,

    /// number of integers in each batch
    #[arg(long, default_value = "4")]
    batch_size: usize,

    #[arg(short = 'e', long, visible_alias = "epochs", default_value = "3")]
    /// number of epochs after which training is finished
    num_epochs: usize,

    /// also finish training once this many batches have been processed
    #[arg(long)]
    after_n_batches: Option<usize>,

    /// don't print the training status before the first epoch, after every epoch, and after training
    #[arg(short, long)]
    quiet: bool,

    /// draw a progress bar over the batches of each epoch
    #[arg(long)]
    progress: bool,

    /// record how long each epoch took in the log
    #[arg(long)]
    timing: bool,

    /// process the batches in a new random order every epoch
    #[arg(long)]
    shuffle: bool,

    /// seed for the shuffling order
    #[arg(long, requires = "shuffle")]
    seed: Option<u64>,

    /// path to the output file for the training log. Supported file extensions are .pkl, .json, and .cbor
    #[arg(short = 'o', long = "log-out")]
    log_output_file: Option<PathBuf>,
}

/// sums each batch, keeping a running total across the whole run
struct SumBatches {
    running_total: i64,
}

impl Algorithm<Vec<i64>> for SumBatches {
    fn process_batch(&mut self, batch: &Vec<i64>) -> Result<LogRow, AlgorithmError> {
        let batch_sum: i64 = batch.iter().sum();
        self.running_total += batch_sum;
        let mut records = LogRow::new();
        records.insert("batch_sum", batch_sum);
        records.insert("running_total", self.running_total);
        Ok(records)
    }
}

const SUPPORTED_EXTENSIONS: [&str; 3] = ["pkl", "json", "cbor"];

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    println!("Using arguments {cli:?}");

    if cli.num_epochs == 0 {
        return Err("the number of epochs must be at least 1".into());
    }
    // check the output file extension to make sure we can save it later. If not, better to fail now than after training
    if let Some(output_file_path) = &cli.log_output_file {
        output_format(output_file_path)?;
    }

    let batches: Vec<Vec<i64>> = (0..cli.batches)
        .map(|i| {
            let start = (i * cli.batch_size) as i64;
            (start..start + cli.batch_size as i64).collect()
        })
        .collect();

    let options = MainLoopOptions::new(None, cli.shuffle, cli.seed)?;
    let mut main_loop = MainLoop::new(batches, SumBatches { running_total: 0 }, options);
    main_loop.add_extension(FinishAfter::new(ConditionOptions {
        after_n_epochs: Some(cli.num_epochs),
        after_n_batches: cli.after_n_batches,
        ..Default::default()
    }));
    if cli.timing {
        main_loop.add_extension(Timing::new());
    }
    if cli.progress {
        main_loop.add_extension(ProgressBar::new(Some(cli.batches as u64)));
    }
    if !cli.quiet {
        main_loop.add_extension(Printing::new());
    }

    main_loop.run()?;
    println!(
        "{} Training complete: {} epochs, {} iterations",
        chrono::Local::now(),
        main_loop.log().status.epochs_done,
        main_loop.log().status.iterations_done
    );

    if let Some(log_output_file) = &cli.log_output_file {
        serialize_log(log_output_file, main_loop.log())?;
    }
    Ok(())
}

fn output_format(output_file_path: &PathBuf) -> Result<&str, Box<dyn Error>> {
    let file_extension = output_file_path
        .extension()
        .and_then(|extension| extension.to_str())
        .ok_or("No file extension found for output file - unable to determine output format")?;
    if !SUPPORTED_EXTENSIONS.contains(&file_extension) {
        return Err(format!(
            "Unsupported file extension: {}. Supported extensions are: {}",
            file_extension,
            SUPPORTED_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(file_extension)
}

fn serialize_log(log_output_file: &PathBuf, log: &TrainingLog) -> Result<(), Box<dyn Error>> {
    println!("Saving training log to file: {:?}", log_output_file);
    let file_extension = output_format(log_output_file)?;
    let mut out_file = File::create(log_output_file)?;
    match file_extension {
        "pkl" => serde_pickle::to_writer(&mut out_file, log, Default::default())?,
        "json" => serde_json::to_writer(&mut out_file, log)?,
        // output_format only lets the supported extensions through
        _ => ciborium::into_writer(log, &mut out_file)?,
    }
    Ok(())
}
