use crate::cmd::session::Session;
use crate::cmd::AnalyzeArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub async fn run(args: AnalyzeArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = args.reply.wait_for()?;
    let session = Session::open(&args.connect).await?;
    session.channel.request_analysis(args.pr);
    session.finish(wait, format).await
}
