use crate::{
    CheckSequenceArgs,
    build::sequence::{self, SequenceOptions},
};

pub async fn run(args: &CheckSequenceArgs) -> Result<(), anyhow::Error> {
    let opts = SequenceOptions {
        dir: args.dir.clone(),
        pattern: args.pattern.clone(),
        check_pages: args.check_pages,
        page_start_at: args.page_start_at,
        case_insensitive: !args.case_sensitive,
    };

    let report = sequence::check(&opts)?;
    sequence::print_report(&report, opts.check_pages);

    if let Some(out) = &args.out {
        sequence::write_report(&report, out).await?;
        println!("Report written to {}", out.display());
    }

    Ok(())
}
