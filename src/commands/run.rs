use crate::{
    RunArgs,
    build::pipeline::{Pipeline, PipelineContext},
    config::PipelineConfig,
};

pub async fn run(args: &RunArgs) -> Result<(), anyhow::Error> {
    let (config, config_path) = PipelineConfig::load_from_arg(args.config_file.as_deref())?;
    let collections = config.select(&args.collections)?;
    let dry_run = args.mode.is_dry_run();

    let mut pipeline = Pipeline::default_pipeline();
    pipeline.without(&args.skip)?;

    println!(
        "Using {} ({})",
        config_path.display(),
        if dry_run { "DRY-RUN" } else { "COMMIT" }
    );

    for collection in collections {
        println!("== {} ==", collection.name);

        let mut ctx = PipelineContext::new(collection, dry_run, config.concurrency);
        let reports = pipeline.run(&mut ctx).await?;

        for report in reports {
            println!("  {}: {}", report.stage, report.summary);
        }
    }

    Ok(())
}
