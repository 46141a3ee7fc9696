use bounded_ward::{cluster_details, ConstrainedWard, ItemMeta, LabelSummarizer, TargetCount};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=bounded_ward=debug shows the estimator, stalls and splits.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Two loose groups of product embeddings in 3D.
    let vectors: Vec<Vec<f32>> = vec![
        // Shoes (near the origin)
        vec![0.0, 0.0, 0.1],
        vec![0.1, 0.0, 0.0],
        vec![0.0, 0.2, 0.0],
        vec![0.2, 0.1, 0.1],
        vec![0.1, 0.1, 0.2],
        // Bags (near (5,5,5))
        vec![5.0, 5.0, 5.1],
        vec![5.1, 5.0, 5.0],
        vec![5.0, 5.2, 5.0],
        vec![5.2, 5.1, 5.1],
    ];
    let ids: Vec<String> = (0..vectors.len()).map(|i| format!("sku-{i:03}")).collect();

    let partition = ConstrainedWard::new(2, 4)
        .with_target(TargetCount::Sweep)
        .fit(&vectors, &ids)?;

    let meta: HashMap<String, ItemMeta> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let labels = if i < 5 {
                vec!["Shoe".to_string(), "Footwear".to_string()]
            } else {
                vec!["Bag".to_string(), "Accessory".to_string()]
            };
            let image_path = Some(format!("/tmp/uploads/{id}.jpg"));
            (id.clone(), ItemMeta { labels, image_path })
        })
        .collect();

    let summarizer = LabelSummarizer::new();
    println!("clusters={}", partition.len());
    for details in cluster_details(&partition, &meta) {
        let labels: String = details.summarize_labels(&summarizer);
        println!(
            "  {}: {:?} labels=[{}] images={:?}",
            details.key, details.item_ids, labels, details.images
        );
    }
    if !partition.dropped.is_empty() {
        println!("dropped={:?}", partition.dropped);
    }

    Ok(())
}
