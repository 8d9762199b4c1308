use crate::{
    IndexPagesArgs,
    build::paginate::{self, DEFAULT_PAGE_SIZE},
};

pub async fn run(args: &IndexPagesArgs) -> Result<(), anyhow::Error> {
    let page_size = u64::try_from(args.page_size)
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let meta = paginate::run(&args.index, &args.out, page_size).await?;
    println!(
        "OK: {} pages generated in {}",
        meta.total_pages,
        args.out.display()
    );

    Ok(())
}
