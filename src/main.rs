use clap::Parser;
use credvault::cli::{commands, output, Cli, Commands, Context};

fn main() {
    let cli = Cli::parse();
    credvault::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        _ => Context::load(&cli).and_then(|ctx| dispatch(&cli, &ctx)),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if e.is_corruption() {
            output::tip("Run `credvault reset` to move the damaged vault aside.");
        }
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: &Cli, ctx: &Context) -> credvault::errors::Result<()> {
    match cli.command {
        Commands::Init => commands::init::execute(ctx),
        Commands::Add {
            ref service,
            ref username,
        } => commands::add::execute(ctx, service, username.as_deref()),
        Commands::Get { ref service } => commands::get::execute(ctx, service),
        Commands::List => commands::list::execute(ctx),
        Commands::Delete { ref service, force } => commands::delete::execute(ctx, service, force),
        Commands::Shell => commands::shell::execute(ctx),
        Commands::Reset { force } => commands::reset::execute(ctx, force),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(ctx, last, since.as_deref())
        }
    }
}
