use chunk_huffman::{verify_files, CodecConfig, Compressor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let dir = std::env::temp_dir().join("chunk_huffman_demo");
    std::fs::create_dir_all(&dir)?;
    let sample = dir.join("sample.csv");
    let packed = dir.join("sample.bin");
    let restored = dir.join("restored.csv");

    let mut text = String::from("id,name,city\n");
    for i in 0..2000 {
        text.push_str(&format!("{},user{},{}\n", i, i % 97, ["Kigali", "Zürich", "東京"][i % 3]));
    }
    std::fs::write(&sample, &text)?;
    println!("Created sample file: {} bytes", text.len());

    let compressor = Compressor::new(CodecConfig {
        chunk_size: 8 * 1024,
        ..CodecConfig::default()
    })?;

    let summary = compressor.compress_file(&sample, &packed)?;
    let compressed_size = std::fs::metadata(&packed)?.len();
    println!(
        "Compressed {} symbols in {} chunks to {} bytes ({:.1}% of original)",
        summary.symbols,
        summary.chunks,
        compressed_size,
        compressed_size as f64 / text.len() as f64 * 100.0
    );

    compressor.decompress_file(&packed, &restored)?;
    let lines = verify_files(&sample, &restored)?;
    println!("Decompression verified: {} lines match", lines);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
