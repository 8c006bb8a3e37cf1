use serenity::{
    builder::CreateApplicationCommand,
    model::{application::command::CommandOptionType, permissions::Permissions},
};

/// Create the `/giveaway` command with its `start` and `end` subcommands
pub fn giveaway_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("giveaway")
        .description("Run giveaways in this server")
        .dm_permission(false)
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("start")
                .description("Start a giveaway in this channel")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("prize")
                        .description("What the winners receive")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("duration")
                        .description("How long entries stay open, in minutes")
                        .kind(CommandOptionType::Integer)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("winners")
                        .description("Number of winners to draw")
                        .kind(CommandOptionType::Integer)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("role")
                        .description("Only members with this role may enter")
                        .kind(CommandOptionType::Role)
                        .required(false)
                })
        })
        .create_option(|option| {
            option
                .name("end")
                .description("End a giveaway now and draw its winners")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("id")
                        .description("Giveaway id, shown in the giveaway's footer")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        });

    command
}
