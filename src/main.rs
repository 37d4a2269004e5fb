use norint_dataset_rs::dataset::{
    DeviceContext, JsonSceneSource, SyntheticFrameReader, create_empty_dataset, load_dataset,
};
use norint_dataset_rs::logger;

use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();

    info!("Starting norint dataset loader...");

    let ctx = DeviceContext::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        // No scene given: exercise the placeholder path.
        let mut dataset = create_empty_dataset(8, 1, false);
        info!(
            n_images = dataset.n_images,
            aabb_scale = dataset.aabb_scale,
            extra_dims = dataset.n_extra_dims(),
            "Placeholder dataset ready"
        );
        dataset.free_memory();
        return Ok(());
    }

    let sources: Vec<JsonSceneSource> = args.iter().map(|p| JsonSceneSource::new(p.as_str())).collect();
    let reader = SyntheticFrameReader::default();

    match load_dataset(&ctx, &sources, &reader, 0.0) {
        Ok(mut dataset) => {
            info!(
                n_images = dataset.n_images,
                n_views = dataset.n_views,
                n_lights = dataset.n_lights,
                scale = dataset.scale,
                "Dataset loaded"
            );
            dataset.free_memory();
        }
        Err(e) => error!("Loading failed: {}", e),
    }

    Ok(())
}
