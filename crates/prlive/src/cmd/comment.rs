use crate::cmd::session::Session;
use crate::cmd::CommentArgs;
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub async fn run(args: CommentArgs, format: OutputFormat) -> CliResult<i32> {
    if args.text.trim().is_empty() {
        return Err(CliError::new(USAGE, "comment text must not be empty"));
    }

    let wait = args.reply.wait_for()?;
    let session = Session::open(&args.connect).await?;
    session.channel.post_comment(args.pr, args.text, args.line);
    session.finish(wait, format).await
}
