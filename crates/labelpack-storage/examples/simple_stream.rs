use bytes::Bytes;
use labelpack_core::Record;
use labelpack_storage::{FileWriter, SampleStream, StreamConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <output.pack> [records] [folds]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let records: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let folds: u32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5);

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut writer = FileWriter::create(path)?;
    for i in 0..records {
        let label = (i % 4) as f32;
        let payload = Bytes::from(format!("sample {} of class {}", i, label));
        writer.append(&Record::new(label, payload))?;
    }
    writer.close()?;

    println!("\n📦 Packed {} records into {}", records, path);

    for fold in 0..folds {
        let mut config = StreamConfig::default();
        config.kfold(folds, fold, false)?;

        let mut stream = SampleStream::open(path, &config)?;
        let mut count = 0;
        while let Some(batch) = stream.next_batch(8)? {
            count += batch.len();
        }

        println!("   Fold {}: {} of {} records held out", fold, count, records);
    }

    Ok(())
}
