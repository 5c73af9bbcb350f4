//! Turns a resolved [`InviteAction`] into sent iTIP messages.
//!
//! Every send belongs to a branch family (REQUEST, CANCEL or REPLY). All
//! sends of one dispatch are launched together and jointly awaited, so a
//! failing send never cancels or blocks its siblings. Failures come back in
//! the [`DispatchReport`], tagged with their branch; nothing is retried.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::{InviteAction, InviteActionKind};
use crate::address::{AddressStatusOracle, StatusOracle};
use crate::diff::canonical_set;
use crate::email::{EmailCanonicalizer, GuessCanonicalizer};
use crate::error::{InviteError, InviteResult};
use crate::event::{Attendee, Event, ParticipationStatus};
use crate::ics::{
    BuildOptions, ChronoTzResolver, IcalendarBuilder, IcsBuilder, IcsMethod, TimezoneResolver,
};
use crate::recipient::{ContactEmailsMap, Recipient, SendPreferencesMap, filter_sendable};
use crate::subject::{DefaultSubjects, SubjectGenerator};
use crate::transport::{SendIcsParams, Transport};

/// Branch family a send belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Request,
    Cancel,
    Reply,
}

/// Result of one branch family.
#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: Branch,
    /// Messages the transport accepted
    pub delivered: usize,
    pub error: Option<InviteError>,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<BranchOutcome>,
}

impl DispatchReport {
    fn failed(branch: Branch, error: InviteError) -> Self {
        let mut report = DispatchReport::default();
        report.record(branch, Err(error));
        report
    }

    /// Fold one send result into its branch. A second error in the same
    /// branch turns the branch error into [`InviteError::Multiple`].
    fn record(&mut self, branch: Branch, result: InviteResult<()>) {
        let index = match self.outcomes.iter().position(|o| o.branch == branch) {
            Some(index) => index,
            None => {
                self.outcomes.push(BranchOutcome {
                    branch,
                    delivered: 0,
                    error: None,
                });
                self.outcomes.len() - 1
            }
        };
        let outcome = &mut self.outcomes[index];

        match result {
            Ok(()) => outcome.delivered += 1,
            Err(error) => {
                outcome.error = Some(match outcome.error.take() {
                    None => error,
                    Some(InviteError::Multiple(mut errors)) => {
                        errors.push(error);
                        InviteError::Multiple(errors)
                    }
                    Some(previous) => InviteError::Multiple(vec![previous, error]),
                });
            }
        }
    }

    pub fn outcome(&self, branch: Branch) -> Option<&BranchOutcome> {
        self.outcomes.iter().find(|o| o.branch == branch)
    }

    pub fn error(&self, branch: Branch) -> Option<&InviteError> {
        self.outcome(branch).and_then(|o| o.error.as_ref())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Branch, &InviteError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| (o.branch, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().map(|o| o.delivered).sum()
    }
}

/// Inputs for one dispatch. The maps are read-only lookups for this call.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub action: &'a InviteAction,
    /// Current snapshot (after the save, or the event being replied to)
    pub event: Option<&'a Event>,
    /// Snapshot CANCELs are built from (before the save or delete)
    pub cancel_event: Option<&'a Event>,
    pub send_preferences: &'a SendPreferencesMap,
    pub contact_emails: &'a ContactEmailsMap,
}

/// The acting identity, checked once per dispatch.
struct Sender {
    address_id: String,
    from: Recipient,
}

/// A fully built message waiting to be handed to the transport.
struct PlannedSend {
    branch: Branch,
    method: IcsMethod,
    ics: String,
    to: Vec<Recipient>,
    subject: String,
}

/// Messages to send plus branches that already failed while building them.
#[derive(Default)]
struct SendPlan {
    sends: Vec<PlannedSend>,
    failures: Vec<(Branch, InviteError)>,
}

impl SendPlan {
    fn push(&mut self, send: PlannedSend) {
        if send.to.is_empty() {
            debug!(method = %send.method, "no sendable recipients, skipping");
            return;
        }
        self.sends.push(send);
    }

    fn fail(&mut self, branch: Branch, error: InviteError) {
        self.failures.push((branch, error));
    }
}

pub struct IcsDispatcher {
    prod_id: String,
    transport: Box<dyn Transport>,
    builder: Box<dyn IcsBuilder>,
    timezones: Box<dyn TimezoneResolver>,
    subjects: Box<dyn SubjectGenerator>,
    oracle: Box<dyn AddressStatusOracle>,
    canonicalizer: Box<dyn EmailCanonicalizer>,
}

impl IcsDispatcher {
    pub fn new(prod_id: impl Into<String>, transport: impl Transport + 'static) -> Self {
        IcsDispatcher {
            prod_id: prod_id.into(),
            transport: Box::new(transport),
            builder: Box::new(IcalendarBuilder),
            timezones: Box::new(ChronoTzResolver),
            subjects: Box::new(DefaultSubjects),
            oracle: Box::new(StatusOracle),
            canonicalizer: Box::new(GuessCanonicalizer),
        }
    }

    pub fn with_builder(mut self, builder: impl IcsBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_timezones(mut self, timezones: impl TimezoneResolver + 'static) -> Self {
        self.timezones = Box::new(timezones);
        self
    }

    pub fn with_subjects(mut self, subjects: impl SubjectGenerator + 'static) -> Self {
        self.subjects = Box::new(subjects);
        self
    }

    pub fn with_oracle(mut self, oracle: impl AddressStatusOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn with_canonicalizer(mut self, canonicalizer: impl EmailCanonicalizer + 'static) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    /// Send the messages `request.action` calls for.
    ///
    /// Never fails as a whole: precondition and transport errors are
    /// reported per branch.
    pub async fn dispatch(&self, request: &DispatchRequest<'_>) -> DispatchReport {
        let kind = request.action.kind;
        let branch = match kind {
            InviteActionKind::None
            | InviteActionKind::CancelDisabled
            | InviteActionKind::DeclineDisabled => {
                debug!(%kind, "nothing to dispatch");
                return DispatchReport::default();
            }
            InviteActionKind::SendInvitation | InviteActionKind::SendUpdate => Branch::Request,
            InviteActionKind::CancelInvitation => Branch::Cancel,
            InviteActionKind::ChangeParticipation | InviteActionKind::DeclineInvitation => {
                Branch::Reply
            }
        };

        let sender = match self.sender(request.action) {
            Ok(sender) => sender,
            Err(error) => {
                warn!(%kind, %error, "cannot dispatch");
                return DispatchReport::failed(branch, error);
            }
        };

        let plan = match kind {
            InviteActionKind::SendInvitation => self.plan_invitation(request).await,
            InviteActionKind::SendUpdate => self.plan_update(request).await,
            InviteActionKind::CancelInvitation => self.plan_cancel(request).await,
            _ => self.plan_reply(request).await,
        };

        self.execute(&sender, plan, request).await
    }

    fn sender(&self, action: &InviteAction) -> InviteResult<Sender> {
        let address = action
            .self_address
            .as_ref()
            .ok_or_else(|| InviteError::Precondition("no self address".into()))?;
        if self.oracle.is_disabled(address) {
            return Err(InviteError::AddressDisabled(address.email.clone()));
        }
        Ok(Sender {
            address_id: address.id.clone(),
            from: Recipient::new(&address.email, address.display_name()),
        })
    }

    async fn plan_invitation(&self, request: &DispatchRequest<'_>) -> SendPlan {
        let mut plan = SendPlan::default();
        let action = request.action;
        let added = action.added_attendees();
        let removed = action.removed_attendees();

        match self.request_ics(request.event).await {
            Ok((event, ics)) => {
                if added.is_empty() && removed.is_empty() {
                    // First send of the event: everyone gets the invitation
                    let to = self.sendable(&event.attendees, request);
                    plan.push(self.request_send(event, ics, to, true));
                } else if !added.is_empty() {
                    let to = self.sendable(added, request);
                    plan.push(self.request_send(event, ics, to, true));
                }
            }
            Err(error) => plan.fail(Branch::Request, error),
        }

        if !removed.is_empty() {
            self.plan_removed_cancel(&mut plan, request).await;
        }

        plan
    }

    async fn plan_update(&self, request: &DispatchRequest<'_>) -> SendPlan {
        let mut plan = SendPlan::default();
        let action = request.action;
        let added = action.added_attendees();

        match self.request_ics(request.event).await {
            Ok((event, ics)) => {
                let added_emails = canonical_set(added, &*self.canonicalizer);
                let remaining: Vec<Attendee> = event
                    .attendees
                    .iter()
                    .filter(|a| !added_emails.contains(&self.canonicalizer.canonicalize(&a.email)))
                    .cloned()
                    .collect();

                let to = self.sendable(&remaining, request);
                plan.push(self.request_send(event, ics.clone(), to, false));

                let to = self.sendable(added, request);
                plan.push(self.request_send(event, ics, to, true));
            }
            Err(error) => plan.fail(Branch::Request, error),
        }

        if !action.removed_attendees().is_empty() {
            self.plan_removed_cancel(&mut plan, request).await;
        }

        plan
    }

    /// CANCEL to attendees dropped by a save, built from the snapshot they
    /// were still part of.
    async fn plan_removed_cancel(&self, plan: &mut SendPlan, request: &DispatchRequest<'_>) {
        let removed = request.action.removed_attendees();
        let Some(cancel_event) = request.cancel_event else {
            plan.fail(
                Branch::Cancel,
                InviteError::Precondition("no previous event to cancel from".into()),
            );
            return;
        };

        match self.cancel_ics(cancel_event, removed).await {
            Ok(ics) => {
                let to = self.sendable(removed, request);
                plan.push(self.cancel_send(cancel_event, ics, to, request));
            }
            Err(error) => plan.fail(Branch::Cancel, error),
        }
    }

    async fn plan_cancel(&self, request: &DispatchRequest<'_>) -> SendPlan {
        let mut plan = SendPlan::default();

        let cancel_event = match request.cancel_event {
            Some(event) if event.has_attendees() => event,
            Some(_) => {
                plan.fail(
                    Branch::Cancel,
                    InviteError::Precondition("event has no attendees to cancel".into()),
                );
                return plan;
            }
            None => {
                plan.fail(
                    Branch::Cancel,
                    InviteError::Precondition("no event to cancel".into()),
                );
                return plan;
            }
        };

        match self.cancel_ics(cancel_event, &cancel_event.attendees).await {
            Ok(ics) => {
                let to = self.sendable(&cancel_event.attendees, request);
                plan.push(self.cancel_send(cancel_event, ics, to, request));
            }
            Err(error) => plan.fail(Branch::Cancel, error),
        }

        plan
    }

    async fn plan_reply(&self, request: &DispatchRequest<'_>) -> SendPlan {
        let mut plan = SendPlan::default();
        match self.reply_send(request).await {
            Ok(send) => plan.push(send),
            Err(error) => plan.fail(Branch::Reply, error),
        }
        plan
    }

    async fn reply_send(&self, request: &DispatchRequest<'_>) -> InviteResult<PlannedSend> {
        let action = request.action;
        let event = request
            .event
            .ok_or_else(|| InviteError::Precondition("no event to reply to".into()))?;
        let organizer = event
            .organizer
            .as_ref()
            .ok_or_else(|| InviteError::Precondition("event has no organizer".into()))?;
        let self_attendee = action
            .self_attendee_index
            .and_then(|index| event.attendees.get(index))
            .ok_or_else(|| InviteError::Precondition("self attendee not found".into()))?;

        let partstat = match action.kind {
            InviteActionKind::DeclineInvitation => {
                Some(action.partstat.unwrap_or(ParticipationStatus::Declined))
            }
            _ => action.partstat.or(self_attendee.response_status),
        };
        let replying = Attendee {
            response_status: partstat,
            ..self_attendee.clone()
        };

        let vtimezones = self.timezones.resolve(event).await?;
        let ics = self.builder.build(
            IcsMethod::Reply,
            &self.prod_id,
            event,
            &BuildOptions {
                vtimezones: &vtimezones,
                attendees_to: Some(std::slice::from_ref(&replying)),
            },
        )?;

        Ok(PlannedSend {
            branch: Branch::Reply,
            method: IcsMethod::Reply,
            ics,
            to: vec![Recipient::from(organizer)],
            subject: self.subjects.subject(IcsMethod::Reply, event, false),
        })
    }

    async fn request_ics<'e>(&self, event: Option<&'e Event>) -> InviteResult<(&'e Event, String)> {
        let event = event.ok_or_else(|| {
            InviteError::Precondition("no event to build the invitation from".into())
        })?;
        let vtimezones = self.timezones.resolve(event).await?;
        let ics = self.builder.build(
            IcsMethod::Request,
            &self.prod_id,
            event,
            &BuildOptions {
                vtimezones: &vtimezones,
                attendees_to: None,
            },
        )?;
        Ok((event, ics))
    }

    async fn cancel_ics(&self, event: &Event, attendees_to: &[Attendee]) -> InviteResult<String> {
        let vtimezones = self.timezones.resolve(event).await?;
        self.builder.build(
            IcsMethod::Cancel,
            &self.prod_id,
            event,
            &BuildOptions {
                vtimezones: &vtimezones,
                attendees_to: Some(attendees_to),
            },
        )
    }

    fn request_send(
        &self,
        event: &Event,
        ics: String,
        to: Vec<Recipient>,
        is_new_invitation: bool,
    ) -> PlannedSend {
        PlannedSend {
            branch: Branch::Request,
            method: IcsMethod::Request,
            ics,
            to,
            subject: self
                .subjects
                .subject(IcsMethod::Request, event, is_new_invitation),
        }
    }

    fn cancel_send(
        &self,
        cancel_event: &Event,
        ics: String,
        to: Vec<Recipient>,
        request: &DispatchRequest<'_>,
    ) -> PlannedSend {
        // Subject dates follow the current event when there is one
        let subject_event = request.event.unwrap_or(cancel_event);
        PlannedSend {
            branch: Branch::Cancel,
            method: IcsMethod::Cancel,
            ics,
            to,
            subject: self.subjects.subject(IcsMethod::Cancel, subject_event, false),
        }
    }

    fn sendable(&self, attendees: &[Attendee], request: &DispatchRequest<'_>) -> Vec<Recipient> {
        filter_sendable(attendees, request.send_preferences, &*self.canonicalizer)
    }

    async fn execute(
        &self,
        sender: &Sender,
        plan: SendPlan,
        request: &DispatchRequest<'_>,
    ) -> DispatchReport {
        let results = join_all(
            plan.sends
                .iter()
                .map(|send| self.send_one(sender, send, request)),
        )
        .await;

        let mut report = DispatchReport::default();
        for (branch, error) in plan.failures {
            warn!(?branch, %error, "branch failed before sending");
            report.record(branch, Err(error));
        }
        for (send, result) in plan.sends.iter().zip(results) {
            match &result {
                Ok(()) => info!(
                    method = %send.method,
                    recipients = send.to.len(),
                    "sent"
                ),
                Err(error) => warn!(method = %send.method, %error, "send failed"),
            }
            report.record(send.branch, result);
        }
        report
    }

    async fn send_one(
        &self,
        sender: &Sender,
        send: &PlannedSend,
        request: &DispatchRequest<'_>,
    ) -> InviteResult<()> {
        self.transport
            .send(&SendIcsParams {
                method: send.method,
                ics: &send.ics,
                address_id: &sender.address_id,
                from: &sender.from,
                to: &send.to,
                subject: &send.subject,
                send_preferences: request.send_preferences,
                contact_emails: request.contact_emails,
            })
            .await
    }
}
