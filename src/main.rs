use clap::{Parser, Subcommand};
use invfile::codec::CodecKind;
use invfile::document::{term_frequency, Corpus, SimpleTokenizer};
use invfile::index::InMemoryIndex;
use invfile::query::{Query, QueryMode};
use invfile::{merge, read_only_keys};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "invfile", version = "1.0.0", about = "Inverted index build/merge/query CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one index file from tokenized JSON corpus files
    Build {
        #[arg(short, long)]
        output: PathBuf,
        /// Codec: naive (default) or delta
        #[arg(short, long, default_value = "naive")]
        codec: String,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Merge two sorted index files into one
    Merge {
        left:  PathBuf,
        right: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value = "naive")]
        codec: String,
    },
    /// List every term and its record offset (posting lists are skipped)
    Keys {
        input: PathBuf,
    },
    /// Run a conjunctive top-k query against an index file
    Query {
        index: PathBuf,
        query: String,
        #[arg(short, long, default_value = "naive")]
        codec: String,
        #[arg(short, long, default_value = "5")]
        top_k: usize,
        /// Use the naive sort-merge engine instead of the threshold algorithm
        #[arg(long)]
        naive: bool,
    },
    /// Incremental build benchmark: one partial index per corpus file,
    /// merged pairwise into a cumulative index
    Bench {
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Directory for partial and merged index files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(short, long, default_value = "naive")]
        codec: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Build ────────────────────────────────────────────────────────────
        Commands::Build { output, codec, input } => {
            let codec = parse_codec(&codec);
            let mut index = InMemoryIndex::new(term_frequency, codec);
            let mut doc_count = 0usize;
            for path in &input {
                let corpus = Corpus::from_json(&std::fs::read_to_string(path)?)?;
                for doc in &corpus.documents {
                    index.add_document(doc);
                }
                doc_count += corpus.documents.len();
                println!("  indexed {} ({} docs)", path.display(), corpus.documents.len());
            }
            index.save(&output)?;
            let size = std::fs::metadata(&output)?.len();
            println!(
                "Created: {}  ({} docs, {} terms, {} B on disk, codec {})",
                output.display(), doc_count, index.term_count(), size, codec.name(),
            );
        }

        // ── Merge ────────────────────────────────────────────────────────────
        Commands::Merge { left, right, output, codec } => {
            let codec = parse_codec(&codec);
            merge(&output, &left, &right, codec)?;
            let size = std::fs::metadata(&output)?.len();
            println!("Merged {} + {} → {}  ({} B)",
                left.display(), right.display(), output.display(), size);
        }

        // ── Keys ─────────────────────────────────────────────────────────────
        Commands::Keys { input } => {
            let keys = read_only_keys(&input)?;
            println!("Index: {}  ({} terms)", input.display(), keys.len());
            println!("{:<28} {:>12}", "Term", "Offset");
            for (term, offset) in keys {
                println!("{term:<28} {offset:>12}");
            }
        }

        // ── Query ────────────────────────────────────────────────────────────
        Commands::Query { index, query, codec, top_k, naive } => {
            let codec = parse_codec(&codec);
            let tokenizer = SimpleTokenizer::default();
            let parsed = if naive {
                Query::new_naive(&query, &tokenizer, &index, codec, QueryMode::Conjunctive)?
            } else {
                Query::new_threshold(&query, &tokenizer, &index, codec, QueryMode::Conjunctive)?
            };

            let t0 = Instant::now();
            let hits = parsed.execute(top_k)?;
            let elapsed = t0.elapsed();

            println!("── Query ────────────────────────────────────────────────");
            println!("  Terms:     {}", parsed.terms().join(" "));
            println!("  Engine:    {}", if naive { "naive" } else { "threshold" });
            println!("  Time:      {:.3} ms", elapsed.as_secs_f64() * 1000.0);
            println!("  Hits:      {}", hits.len());
            for (rank, (doc_id, score)) in hits.iter().enumerate() {
                println!("  {:>3}. doc {:<12} score {}", rank + 1, doc_id, score);
            }
        }

        // ── Bench ────────────────────────────────────────────────────────────
        Commands::Bench { input, out_dir, codec } => {
            let codec = parse_codec(&codec);
            std::fs::create_dir_all(&out_dir)?;

            println!("── Incremental build benchmark ──────────────────────────");
            println!("{:<24} {:>10} {:>10} {:>10}", "Corpus", "Save ms", "Merge ms", "Total ms");

            let mut cumulative: Option<PathBuf> = None;
            let mut merged_count = 0usize;
            for path in &input {
                let t0 = Instant::now();

                let corpus = Corpus::from_json(&std::fs::read_to_string(path)?)?;
                let mut partial = InMemoryIndex::new(term_frequency, codec);
                for doc in &corpus.documents {
                    partial.add_document(doc);
                }
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                let partial_path = out_dir.join(format!("doc_{stem}.if"));
                partial.save(&partial_path)?;
                let save_ms = t0.elapsed().as_secs_f64() * 1000.0;

                let t1 = Instant::now();
                cumulative = Some(match cumulative {
                    None => partial_path,
                    Some(prev) => {
                        let merged_path = out_dir.join(format!("merged_{merged_count}.if"));
                        merge(&merged_path, &prev, &partial_path, codec)?;
                        merged_count += 1;
                        merged_path
                    }
                });
                let merge_ms = t1.elapsed().as_secs_f64() * 1000.0;

                println!(
                    "{:<24} {:>10.2} {:>10.2} {:>10.2}",
                    stem, save_ms, merge_ms,
                    t0.elapsed().as_secs_f64() * 1000.0,
                );
            }

            if let Some(final_path) = cumulative {
                let size = std::fs::metadata(&final_path)?.len();
                println!("Cumulative index: {}  ({} B)", final_path.display(), size);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_codec(s: &str) -> CodecKind {
    CodecKind::from_name(s).unwrap_or_else(|| {
        eprintln!("Unknown codec '{}', defaulting to naive", s);
        CodecKind::Naive
    })
}
