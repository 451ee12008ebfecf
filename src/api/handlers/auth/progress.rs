//! Dual-channel signup verification state machine.
//!
//! Each channel moves `Unsent -> Sent -> Verified`, with `Sent -> Sent`
//! allowed on resend. The overall signup completes when BOTH channels are
//! verified; the completion guard is evaluated after every transition and is
//! independent of which channel verifies first, even though dispatch policy
//! is sequential (phone passcode is withheld until email verifies).

use super::types::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelState {
    Unsent,
    Sent,
    Verified,
}

impl ChannelState {
    /// Sending (or resending) a passcode. Verified channels stay verified.
    #[must_use]
    pub(crate) fn sent(self) -> Self {
        match self {
            Self::Unsent | Self::Sent => Self::Sent,
            Self::Verified => Self::Verified,
        }
    }

    /// A successful verification. Only a `Sent` channel can verify; a failed
    /// verification leaves the state untouched, so there is no transition for it.
    #[must_use]
    pub(crate) fn verified(self) -> Self {
        match self {
            Self::Unsent => Self::Unsent,
            Self::Sent | Self::Verified => Self::Verified,
        }
    }

    #[must_use]
    pub(crate) fn is_verified(self) -> bool {
        self == Self::Verified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignupProgress {
    pub(crate) email: ChannelState,
    pub(crate) phone: ChannelState,
}

impl SignupProgress {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            email: ChannelState::Unsent,
            phone: ChannelState::Unsent,
        }
    }

    /// Rebuild progress from persisted account flags.
    #[must_use]
    pub(crate) fn from_flags(email_verified: bool, phone_verified: bool, phone_sent: bool) -> Self {
        Self {
            // The email passcode is dispatched at signup, so the channel is
            // never observed as Unsent once an account row exists.
            email: if email_verified {
                ChannelState::Verified
            } else {
                ChannelState::Sent
            },
            phone: if phone_verified {
                ChannelState::Verified
            } else if phone_sent {
                ChannelState::Sent
            } else {
                ChannelState::Unsent
            },
        }
    }

    pub(crate) fn record_sent(&mut self, channel: Channel) {
        match channel {
            Channel::Email => self.email = self.email.sent(),
            Channel::Phone => self.phone = self.phone.sent(),
        }
    }

    pub(crate) fn record_verified(&mut self, channel: Channel) {
        match channel {
            Channel::Email => self.email = self.email.verified(),
            Channel::Phone => self.phone = self.phone.verified(),
        }
    }

    /// Completion guard: true iff both channels report verified.
    #[must_use]
    pub(crate) fn is_complete(&self) -> bool {
        self.email.is_verified() && self.phone.is_verified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_progress_is_incomplete() {
        let progress = SignupProgress::new();
        assert!(!progress.is_complete());
        assert_eq!(progress.email, ChannelState::Unsent);
        assert_eq!(progress.phone, ChannelState::Unsent);
    }

    #[test]
    fn resend_keeps_channel_sent() {
        let mut progress = SignupProgress::new();
        progress.record_sent(Channel::Email);
        progress.record_sent(Channel::Email);
        assert_eq!(progress.email, ChannelState::Sent);
        assert!(!progress.is_complete());
    }

    #[test]
    fn verify_does_not_regress_a_verified_channel() {
        let mut progress = SignupProgress::new();
        progress.record_sent(Channel::Email);
        progress.record_verified(Channel::Email);
        progress.record_sent(Channel::Email);
        assert_eq!(progress.email, ChannelState::Verified);
    }

    #[test]
    fn unsent_channel_cannot_verify() {
        let mut progress = SignupProgress::new();
        progress.record_verified(Channel::Phone);
        assert_eq!(progress.phone, ChannelState::Unsent);
    }

    #[test]
    fn completion_fires_iff_both_verified_in_either_order() {
        // email first
        let mut progress = SignupProgress::new();
        progress.record_sent(Channel::Email);
        progress.record_verified(Channel::Email);
        assert!(!progress.is_complete());
        progress.record_sent(Channel::Phone);
        progress.record_verified(Channel::Phone);
        assert!(progress.is_complete());

        // phone first
        let mut progress = SignupProgress::new();
        progress.record_sent(Channel::Email);
        progress.record_sent(Channel::Phone);
        progress.record_verified(Channel::Phone);
        assert!(!progress.is_complete());
        progress.record_verified(Channel::Email);
        assert!(progress.is_complete());
    }

    #[test]
    fn failed_verification_leaves_other_channel_untouched() {
        let mut progress = SignupProgress::new();
        progress.record_sent(Channel::Email);
        progress.record_sent(Channel::Phone);
        progress.record_verified(Channel::Email);
        // a failed phone verification performs no transition at all
        assert_eq!(progress.email, ChannelState::Verified);
        assert_eq!(progress.phone, ChannelState::Sent);
    }

    #[test]
    fn from_flags_round_trips() {
        let progress = SignupProgress::from_flags(true, false, true);
        assert_eq!(progress.email, ChannelState::Verified);
        assert_eq!(progress.phone, ChannelState::Sent);
        assert!(!progress.is_complete());

        let progress = SignupProgress::from_flags(true, true, true);
        assert!(progress.is_complete());

        let progress = SignupProgress::from_flags(false, false, false);
        assert_eq!(progress.phone, ChannelState::Unsent);
    }
}
