use giveaways_core::models::ParticipantId;
use giveaways_core::notifier::EligibilityChecker;
use serenity::model::guild::Member;

/// Role ids held by the member who pressed a button.
#[derive(Debug, Clone, Default)]
pub struct MemberRoles {
    roles: Vec<String>,
}

impl MemberRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Outside a guild there is no member and so no roles.
    pub fn from_member(member: Option<&Member>) -> Self {
        member
            .map(|member| Self::new(member.roles.iter().map(|role| role.to_string())))
            .unwrap_or_default()
    }
}

impl EligibilityChecker for MemberRoles {
    fn is_eligible(&self, _participant: &ParticipantId, required_role_ref: Option<&str>) -> bool {
        match required_role_ref {
            None => true,
            Some(required) => self.roles.iter().any(|role| role == required),
        }
    }
}
