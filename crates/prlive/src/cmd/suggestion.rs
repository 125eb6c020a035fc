use crate::cmd::session::Session;
use crate::cmd::SuggestionArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub async fn run(args: SuggestionArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = args.reply.wait_for()?;
    let session = Session::open(&args.connect).await?;
    session.channel.set_suggestion_status(args.id, args.status);
    session.finish(wait, format).await
}
