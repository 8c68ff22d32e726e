use data_loader::{load_evaluation_targets, load_metadata};
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data");

    println!("Loading movie metadata...\n");

    let start = Instant::now();
    let metadata = load_metadata(&data_dir.join("movies_metadata.csv"))
        .expect("Failed to load metadata");
    let elapsed = start.elapsed();

    println!("=== Metadata ===");
    println!("Time taken: {:?}", elapsed);
    println!("Rows read: {}", metadata.rows_read);
    println!("Movies: {}", metadata.records.len());
    println!("Skipped: {}", metadata.rows_skipped);
    println!("Duplicates: {}", metadata.duplicates);
    println!("\nPerformance: {:.0} rows/second",
             metadata.rows_read as f64 / elapsed.as_secs_f64());

    let start = Instant::now();
    let (targets, report) = load_evaluation_targets(&data_dir.join("evaluation_ratings.csv"))
        .expect("Failed to load evaluation targets");

    println!("\n=== Evaluation targets ===");
    println!("Time taken: {:?}", start.elapsed());
    println!("Users: {}", targets.user_count());
    println!("Targets: {}", targets.target_count());
    println!("Skipped: {}", report.rows_skipped);
}
