use crate::{
    RenameArgs,
    build::rename::{self, RenameOptions},
};

pub async fn run(args: &RenameArgs) -> Result<(), anyhow::Error> {
    let opts = RenameOptions {
        dir: args.dir.clone(),
        pattern: args.pattern.clone(),
        conflict: args.conflict,
        dry_run: args.mode.is_dry_run(),
    };

    let summary = rename::run(&opts).await?;
    println!("{}", summary.line(&opts.dir, opts.dry_run));

    Ok(())
}
