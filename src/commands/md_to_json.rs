use crate::{
    MdToJsonArgs,
    build::convert::{self, ConvertOptions},
    util::default_concurrency,
};

pub async fn run(args: &MdToJsonArgs) -> Result<(), anyhow::Error> {
    let opts = ConvertOptions {
        src: args.src.clone(),
        out: args.out.clone(),
        index: args.index.clone(),
        concurrency: args.concurrency.unwrap_or_else(default_concurrency),
    };

    let summary = convert::run(&opts).await?;
    println!("{}", summary.line());

    Ok(())
}
