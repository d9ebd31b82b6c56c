use std::time::Instant;

use voice_codebook::{
    codebook::{Codebook, CodebookTransformerParamsBuilder},
    gaussian::{Cluster, GaussianComponent},
    stream::ByteOrder,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = CodebookTransformerParamsBuilder::default()
        .codebook_file(std::env::temp_dir().join("demo.codebook"))
        .is_context_based_preselection(true)
        .total_context_neighbours(2usize)
        .build()?;
    println!("{}", params.to_json_string()?);

    // Stand-in for clusters trained offline
    let codebook: Codebook = (0..8)
        .map(|i| {
            let centre = i as f64;
            let cluster = Cluster::new(
                vec![centre, -centre, 0.5 * centre],
                vec![
                    vec![1.0 + 0.1 * centre, 0.2, 0.0],
                    vec![0.2, 1.0, 0.1],
                    vec![0.0, 0.1, 0.5],
                ],
            );
            GaussianComponent::from_cluster(&cluster)
        })
        .collect();

    codebook.save(&params.codebook_file, ByteOrder::Big)?;
    let loaded = Codebook::load(&params.codebook_file, codebook.len(), ByteOrder::Big)?;

    let frame = [3.2, -2.9, 1.4];
    let position = 3usize;

    let eval_start = Instant::now();
    let densities = match params.context_neighbours() {
        Some(n) => {
            let candidates: Vec<usize> =
                (position.saturating_sub(n)..=position + n).collect();
            loaded.probabilities_for(&frame, &candidates)
        }
        None => loaded.probabilities(&frame).into_iter().enumerate().collect(),
    };
    println!("Evaluated {} components in {:.2?}", densities.len(), eval_start.elapsed());

    for (index, p) in densities {
        println!("  component {index}: {p:.6e}");
    }

    std::fs::remove_file(&params.codebook_file)?;
    Ok(())
}
