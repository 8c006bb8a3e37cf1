use async_trait::async_trait;
use mockall::mock;

use crate::errors::NotifyError;
use crate::models::{GiveawayRecord, ParticipantId};
use crate::notifier::Notifier;

// Mock collaborators for testing
mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn announce_open(
            &self,
            record: &GiveawayRecord,
        ) -> Result<Option<String>, NotifyError>;

        async fn announce_closed(
            &self,
            record: &GiveawayRecord,
            winners: &[ParticipantId],
        ) -> Result<(), NotifyError>;

        async fn announce_no_participants(
            &self,
            record: &GiveawayRecord,
        ) -> Result<(), NotifyError>;
    }
}
