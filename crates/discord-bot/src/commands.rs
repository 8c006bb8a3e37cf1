use serenity::builder::CreateApplicationCommands;

pub mod giveaway;

/// Register all commands for the bot.
pub fn register_commands(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands.create_application_command(|command| {
        *command = giveaway::giveaway_command();
        command
    });

    commands
}
