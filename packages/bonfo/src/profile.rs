//! Tracking and switching the device's active PID and rate profiles.
//!
//! The device is the source of truth. [`ProfileSelector`] keeps the last pair
//! the device reported, stages local changes on top of it, and only marks them
//! as applied once a fresh status query shows the device agrees.

use bonfo_msp::{ProfileKind, ProfileRangeError, ProfileSelection, Profiles};
use log::{debug, warn};

/// The device operations the selector needs.
#[allow(async_fn_in_trait)]
pub trait ProfileLink {
    type Error: From<ProfileRangeError>;

    /// Sends a select-setting message for one profile.
    async fn select(&self, selection: ProfileSelection) -> Result<(), Self::Error>;

    /// Queries the profiles the device currently has selected.
    async fn fetch_profiles(&self) -> Result<Profiles, Self::Error>;
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SyncState {
    /// The device has not been queried yet.
    #[default]
    Unfetched,
    /// The staged profiles match what the device reported.
    Clean,
    /// There are local changes the device has not confirmed.
    AwaitingApply,
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ProfileSelector {
    confirmed: Option<Profiles>,
    staged_pid: Option<u8>,
    staged_rate: Option<u8>,
    state: SyncState,
}

impl ProfileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// The profiles the device last reported.
    pub const fn confirmed(&self) -> Option<Profiles> {
        self.confirmed
    }

    /// The profiles the device should end up on once changes are applied.
    ///
    /// `None` until the device has been queried.
    pub fn requested(&self) -> Option<Profiles> {
        let confirmed = self.confirmed?;
        Some(Profiles {
            pid: self.staged_pid.unwrap_or(confirmed.pid),
            rate: self.staged_rate.unwrap_or(confirmed.rate),
        })
    }

    /// Stages a PID profile switch.
    pub fn set_pid(&mut self, pid: i32) -> Result<(), ProfileRangeError> {
        self.staged_pid = Some(ProfileKind::Pid.check(pid)?);
        self.state = SyncState::AwaitingApply;
        Ok(())
    }

    /// Stages a rate profile switch.
    pub fn set_rate(&mut self, rate: i32) -> Result<(), ProfileRangeError> {
        self.staged_rate = Some(ProfileKind::Rate.check(rate)?);
        self.state = SyncState::AwaitingApply;
        Ok(())
    }

    /// Records profiles reported by the device.
    ///
    /// The first report moves the selector out of [`SyncState::Unfetched`].
    /// Staged changes are kept.
    pub fn observe(&mut self, profiles: Profiles) {
        self.confirmed = Some(profiles);
        if self.state == SyncState::Unfetched {
            self.state = SyncState::Clean;
        }
    }

    /// Queries the device and records its profiles.
    pub async fn refresh<L: ProfileLink>(&mut self, link: &L) -> Result<Profiles, L::Error> {
        let profiles = link.fetch_profiles().await?;
        debug!("Device reports {profiles}");
        self.observe(profiles);
        Ok(profiles)
    }

    /// Sends staged changes to the device and checks that they took.
    ///
    /// Returns `Ok(false)` without touching the device if nothing is staged.
    /// Only profiles that differ from the device's are selected. Afterwards
    /// the device is queried again: if it reports the requested pair the
    /// selector becomes [`SyncState::Clean`] and `Ok(true)` is returned.
    /// Otherwise the changes stay staged and `Ok(false)` is returned so the
    /// caller can retry.
    pub async fn apply_changes<L: ProfileLink>(&mut self, link: &L) -> Result<bool, L::Error> {
        if self.state != SyncState::AwaitingApply {
            return Ok(false);
        }

        let confirmed = match self.confirmed {
            Some(confirmed) => confirmed,
            None => self.refresh(link).await?,
        };
        let requested = Profiles {
            pid: self.staged_pid.unwrap_or(confirmed.pid),
            rate: self.staged_rate.unwrap_or(confirmed.rate),
        };

        if requested.pid != confirmed.pid {
            debug!("PID profile differs, selecting {}", requested.pid);
            link.select(ProfileSelection::Pid(requested.pid)).await?;
        }
        if requested.rate != confirmed.rate {
            debug!("Rate profile differs, selecting {}", requested.rate);
            link.select(ProfileSelection::Rate(requested.rate)).await?;
        }

        let found = link.fetch_profiles().await?;
        self.confirmed = Some(found);

        if found == requested {
            self.staged_pid = None;
            self.staged_rate = None;
            self.state = SyncState::Clean;
            Ok(true)
        } else {
            warn!("Asked the device for {requested} but it reports {found}");
            Ok(false)
        }
    }
}

/// An entered profile switch that may need to be undone.
///
/// Created by [`ProfileScope::enter`], which applies the requested profiles
/// right away. [`ProfileScope::exit`] puts the previous profiles back if
/// asked to. [`BoardSession::with_profile`](crate::session::BoardSession::with_profile)
/// wraps both around a closure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[must_use = "the previous profiles are only restored by `ProfileScope::exit`"]
pub struct ProfileScope {
    revert_to: Option<Profiles>,
    revert_on_exit: bool,
    applied: bool,
}

impl ProfileScope {
    /// Stages `pid` and `rate` and applies them.
    ///
    /// Both indices are range checked before anything is staged or sent. A
    /// device that does not switch is logged, not treated as an error. Check
    /// [`ProfileScope::applied`].
    pub async fn enter<L: ProfileLink>(
        selector: &mut ProfileSelector,
        link: &L,
        pid: Option<i32>,
        rate: Option<i32>,
        revert_on_exit: bool,
    ) -> Result<Self, L::Error> {
        if let Some(pid) = pid {
            ProfileKind::Pid.check(pid)?;
        }
        if let Some(rate) = rate {
            ProfileKind::Rate.check(rate)?;
        }

        if selector.confirmed().is_none() {
            selector.refresh(link).await?;
        }
        let revert_to = selector.confirmed();
        debug!("Entering profile scope {pid:?}/{rate:?}, previously {revert_to:?}");

        if let Some(pid) = pid {
            selector.set_pid(pid)?;
        }
        if let Some(rate) = rate {
            selector.set_rate(rate)?;
        }

        let applied = selector.apply_changes(link).await?;
        if !applied && selector.state() == SyncState::AwaitingApply {
            warn!("Device did not switch to the requested profiles");
        }

        Ok(Self {
            revert_to,
            revert_on_exit,
            applied,
        })
    }

    /// The profiles selected before the scope was entered.
    pub const fn revert_target(&self) -> Option<Profiles> {
        self.revert_to
    }

    /// Whether entering switched the device to the requested profiles.
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Restores the previous profiles if the scope was entered with
    /// `revert_on_exit`.
    ///
    /// Returns whether the device ended up where it should.
    pub async fn exit<L: ProfileLink>(
        self,
        selector: &mut ProfileSelector,
        link: &L,
    ) -> Result<bool, L::Error> {
        let Some(target) = self.revert_to.filter(|_| self.revert_on_exit) else {
            return Ok(true);
        };

        debug!("Reverting profiles to {target}");
        selector.set_pid(target.pid.into())?;
        selector.set_rate(target.rate.into())?;
        selector.apply_changes(link).await
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Select(ProfileSelection),
        Fetch,
    }

    /// A device whose profiles follow select messages, unless told to ignore them.
    #[derive(Default)]
    struct FakeBoard {
        profiles: RefCell<Option<Profiles>>,
        ignore_selects: bool,
        calls: RefCell<Vec<Call>>,
        fail_fetches: RefCell<VecDeque<bool>>,
    }

    impl FakeBoard {
        fn new(pid: u8, rate: u8) -> Self {
            Self {
                profiles: RefCell::new(Some(Profiles { pid, rate })),
                ..Default::default()
            }
        }

        fn selects(&self) -> Vec<ProfileSelection> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Select(s) => Some(*s),
                    Call::Fetch => None,
                })
                .collect()
        }
    }

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Range,
        Link,
    }

    impl From<ProfileRangeError> for FakeError {
        fn from(_: ProfileRangeError) -> Self {
            FakeError::Range
        }
    }

    impl ProfileLink for FakeBoard {
        type Error = FakeError;

        async fn select(&self, selection: ProfileSelection) -> Result<(), FakeError> {
            self.calls.borrow_mut().push(Call::Select(selection));
            if !self.ignore_selects {
                let mut profiles = self.profiles.borrow_mut();
                let profiles = profiles.as_mut().ok_or(FakeError::Link)?;
                match selection {
                    ProfileSelection::Pid(pid) => profiles.pid = pid,
                    ProfileSelection::Rate(rate) => profiles.rate = rate,
                }
            }
            Ok(())
        }

        async fn fetch_profiles(&self) -> Result<Profiles, FakeError> {
            self.calls.borrow_mut().push(Call::Fetch);
            if self.fail_fetches.borrow_mut().pop_front().unwrap_or(false) {
                return Err(FakeError::Link);
            }
            self.profiles.borrow().ok_or(FakeError::Link)
        }
    }

    #[test]
    fn ranges() {
        let mut selector = ProfileSelector::new();

        for pid in [-1, 0, 4] {
            assert!(selector.set_pid(pid).is_err());
        }
        for rate in [0, 7] {
            assert!(selector.set_rate(rate).is_err());
        }
        // Rejected values leave no trace.
        assert_eq!(selector.state(), SyncState::Unfetched);

        for pid in 1..=3 {
            selector.set_pid(pid).unwrap();
        }
        for rate in 1..=6 {
            selector.set_rate(rate).unwrap();
        }
        assert_eq!(selector.state(), SyncState::AwaitingApply);
    }

    #[tokio::test]
    async fn first_fetch_is_clean() {
        let board = FakeBoard::new(2, 4);
        let mut selector = ProfileSelector::new();
        assert_eq!(selector.state(), SyncState::Unfetched);
        assert_eq!(selector.requested(), None);

        selector.refresh(&board).await.unwrap();
        assert_eq!(selector.state(), SyncState::Clean);
        assert_eq!(selector.confirmed(), Some(Profiles { pid: 2, rate: 4 }));
    }

    #[tokio::test]
    async fn apply_without_changes_does_nothing() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();
        selector.refresh(&board).await.unwrap();
        board.calls.borrow_mut().clear();

        assert_eq!(selector.apply_changes(&board).await, Ok(false));
        assert!(board.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn apply_only_selects_what_changed() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();
        selector.refresh(&board).await.unwrap();

        selector.set_pid(1).unwrap();
        selector.set_rate(3).unwrap();
        assert_eq!(selector.state(), SyncState::AwaitingApply);

        assert_eq!(selector.apply_changes(&board).await, Ok(true));
        assert_eq!(board.selects(), [ProfileSelection::Rate(3)]);
        assert_eq!(selector.state(), SyncState::Clean);
        assert_eq!(selector.confirmed(), Some(Profiles { pid: 1, rate: 3 }));
    }

    #[tokio::test]
    async fn mismatch_stays_awaiting() {
        let board = FakeBoard {
            ignore_selects: true,
            ..FakeBoard::new(1, 1)
        };
        let mut selector = ProfileSelector::new();
        selector.refresh(&board).await.unwrap();

        selector.set_pid(2).unwrap();
        assert_eq!(selector.apply_changes(&board).await, Ok(false));
        assert_eq!(selector.state(), SyncState::AwaitingApply);
        assert_eq!(selector.confirmed(), Some(Profiles { pid: 1, rate: 1 }));
        assert_eq!(selector.requested(), Some(Profiles { pid: 2, rate: 1 }));

        // Retrying sends the select again.
        assert_eq!(selector.apply_changes(&board).await, Ok(false));
        assert_eq!(board.selects().len(), 2);
    }

    #[tokio::test]
    async fn link_errors_leave_changes_staged() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();
        selector.refresh(&board).await.unwrap();

        selector.set_pid(3).unwrap();
        board.fail_fetches.borrow_mut().push_back(true);

        assert_eq!(selector.apply_changes(&board).await, Err(FakeError::Link));
        assert_eq!(selector.state(), SyncState::AwaitingApply);

        assert_eq!(selector.apply_changes(&board).await, Ok(true));
        assert_eq!(selector.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn staging_before_the_first_fetch() {
        let board = FakeBoard::new(1, 5);
        let mut selector = ProfileSelector::new();

        selector.set_pid(2).unwrap();
        assert_eq!(selector.apply_changes(&board).await, Ok(true));
        assert_eq!(selector.confirmed(), Some(Profiles { pid: 2, rate: 5 }));
        assert_eq!(board.selects(), [ProfileSelection::Pid(2)]);
    }

    #[tokio::test]
    async fn scope_reverts_on_exit() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();

        let scope = ProfileScope::enter(&mut selector, &board, Some(3), Some(6), true)
            .await
            .unwrap();
        assert!(scope.applied());
        assert_eq!(scope.revert_target(), Some(Profiles { pid: 1, rate: 1 }));
        assert_eq!(*board.profiles.borrow(), Some(Profiles { pid: 3, rate: 6 }));

        assert_eq!(scope.exit(&mut selector, &board).await, Ok(true));
        assert_eq!(*board.profiles.borrow(), Some(Profiles { pid: 1, rate: 1 }));
        assert_eq!(selector.state(), SyncState::Clean);
    }

    #[tokio::test]
    async fn scope_without_revert() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();

        let scope = ProfileScope::enter(&mut selector, &board, None, Some(2), false)
            .await
            .unwrap();
        assert_eq!(scope.exit(&mut selector, &board).await, Ok(true));
        assert_eq!(*board.profiles.borrow(), Some(Profiles { pid: 1, rate: 2 }));
        assert_eq!(board.selects(), [ProfileSelection::Rate(2)]);
    }

    #[tokio::test]
    async fn scope_checks_ranges_first() {
        let board = FakeBoard::new(1, 1);
        let mut selector = ProfileSelector::new();

        let result = ProfileScope::enter(&mut selector, &board, Some(2), Some(7), true).await;
        assert_eq!(result, Err(FakeError::Range));
        assert!(board.calls.borrow().is_empty());
        assert_eq!(selector.state(), SyncState::Unfetched);
    }
}
