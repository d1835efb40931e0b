//! Command-line driver for the ferrite-backprop library.
//!
//! The library only computes outputs and gradients; this binary is the
//! outer loop that picks batches and learning rates.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ferrite_backprop::{
    train_loop, Activation, Network, NetworkSpec, Sample, TrainConfig,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ferrite-backprop")]
#[command(about = "Feed-forward network with manual backpropagation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a 2→N→2 network on XOR, labels 0 and 1
    Train {
        /// Hidden layer width
        #[arg(long, default_value = "4")]
        hidden: usize,

        /// Use ReLU instead of sigmoid
        #[arg(long)]
        relu: bool,

        /// JSON training config; overrides the flags below
        #[arg(long)]
        config: Option<String>,

        #[arg(long, default_value = "3000")]
        epochs: usize,

        #[arg(long, default_value = "4")]
        batch_size: usize,

        #[arg(long, default_value = "3.0")]
        learning_rate: f32,

        #[arg(long, default_value = "500")]
        eval_every: usize,

        #[arg(long)]
        seed: Option<u64>,

        /// Write the trained parameters here
        #[arg(long)]
        save: Option<String>,

        /// Write the network spec (JSON) here
        #[arg(long)]
        save_spec: Option<String>,
    },

    /// Print the layers of a parameter file and check it for NaN/Inf
    Inspect {
        path: String,

        /// Spec to validate against; without it records are read until EOF
        #[arg(long)]
        spec: Option<String>,
    },

    /// Run one input through a saved network
    Predict {
        path: String,

        #[arg(long)]
        spec: String,

        /// Comma-separated input values
        #[arg(long)]
        input: String,
    },
}

fn xor_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![0.0, 0.0], 0),
        Sample::new(vec![0.0, 1.0], 1),
        Sample::new(vec![1.0, 0.0], 1),
        Sample::new(vec![1.0, 1.0], 0),
    ]
}

fn parse_input(s: &str) -> Result<Vec<f32>> {
    s.split(',')
        .map(|v| v.trim().parse::<f32>().with_context(|| format!("invalid input value {:?}", v)))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train {
            hidden,
            relu,
            config,
            epochs,
            batch_size,
            learning_rate,
            eval_every,
            seed,
            save,
            save_spec,
        } => {
            let config = match config {
                Some(path) => TrainConfig::load_json(&path)
                    .with_context(|| format!("loading training config {}", path))?,
                None => TrainConfig { epochs, batch_size, learning_rate, eval_every, seed },
            };
            let activation = if relu { Activation::ReLU } else { Activation::Sigmoid };
            let spec = NetworkSpec::from_dims("xor", &[2, hidden, 2], activation);

            let mut rng = config.rng();
            let mut network = Network::new(&spec, &mut rng)?;
            let samples = xor_samples();

            info!(hidden, epochs = config.epochs, learning_rate = config.learning_rate, "training on XOR");
            let summary = train_loop(&mut network, &samples, None, &config, &mut rng)?;
            if let Some(last) = summary.last() {
                info!(epoch = last.epoch, cost = last.cost, accuracy = last.accuracy, "done");
            }

            for sample in &samples {
                let output = network.forward(&sample.input).to_vec();
                println!("{:?} -> {:.4?} (label {})", sample.input, output, sample.label);
            }

            if let Some(path) = save {
                network.save(&path)?;
            }
            if let Some(path) = save_spec {
                spec.save_json(&path)?;
            }
        }

        Commands::Inspect { path, spec } => {
            let network = match spec {
                Some(spec_path) => {
                    let spec = NetworkSpec::load_json(&spec_path)?;
                    Network::load(&path, &spec)?
                }
                None => {
                    let file = std::fs::File::open(&path)
                        .with_context(|| format!("opening {}", path))?;
                    let mut reader = std::io::BufReader::new(file);
                    Network::read_records(&mut reader, Activation::default())?
                }
            };

            for (i, layer) in network.layers().iter().enumerate() {
                println!(
                    "layer {}: {} -> {} ({} parameters)",
                    i,
                    layer.input_count(),
                    layer.output_count(),
                    layer.parameters().len()
                );
            }
            match network.first_non_finite() {
                Some((layer, index, value)) => {
                    println!("non-finite parameter {} at layer {}, index {}", value, layer, index)
                }
                None => println!("all parameters finite"),
            }
        }

        Commands::Predict { path, spec, input } => {
            let spec = NetworkSpec::load_json(&spec)?;
            let mut network = Network::load(&path, &spec)?;
            let input = parse_input(&input)?;
            anyhow::ensure!(
                input.len() == network.input_count(),
                "network expects {} inputs, got {}",
                network.input_count(),
                input.len()
            );

            let output = network.forward(&input).to_vec();
            println!("activations: {:.6?}", output);
            println!("class: {}", ferrite_backprop::argmax(&output));
        }
    }

    Ok(())
}
