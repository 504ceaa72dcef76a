// src/workflow/targeting.rs
//
// Pure mapping from a workflow event to the set of notifications it
// produces. Recipient descriptors are resolved to live sessions only at
// delivery time, which keeps this module free of connection state.
use crate::db::models::notification::{Notification, Recipient, Severity};
use crate::db::models::requests::Outcome;
use crate::db::models::user::Role;
use crate::workflow::{DecisionTier, WorkflowEvent};

/// One notification the policy decided to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient: Recipient,
    pub message: String,
    pub severity: Severity,
    pub link: Option<String>,
}

impl NotificationDraft {
    pub fn into_notification(self) -> Notification {
        Notification::new(self.recipient, self.message, self.severity, self.link)
    }
}

fn admin_link(request_id: i32) -> Option<String> {
    Some(format!("/admin/requests/details/{request_id}"))
}

fn home_link(request_id: i32) -> Option<String> {
    Some(format!("/home/requests/details/{request_id}"))
}

fn outcome_fr(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Approve => "approuvée",
        Outcome::Reject => "rejetée",
    }
}

/// Computes recipients and copy for one workflow event. Deterministic and
/// side-effect free.
pub fn recipients_for(event: &WorkflowEvent) -> Vec<NotificationDraft> {
    match event {
        WorkflowEvent::Created {
            request_id,
            category,
            owner_name,
            ..
        } => {
            let message = format!(
                "Nouvelle demande de {} créée par {}.",
                category.label_fr(),
                owner_name
            );
            let mut drafts = vec![NotificationDraft {
                recipient: Recipient::Role { role: Role::Admin },
                message: message.clone(),
                severity: Severity::Info,
                link: admin_link(*request_id),
            }];
            // Chefs only hear about requests they will have to decide on.
            if category.requires_chef_step() {
                drafts.push(NotificationDraft {
                    recipient: Recipient::Role { role: Role::Chef },
                    message,
                    severity: Severity::Info,
                    link: home_link(*request_id),
                });
            }
            drafts
        }
        WorkflowEvent::Decided {
            request_id,
            category,
            owner_id,
            owner_name,
            outcome,
            tier: DecisionTier::Chef,
            actor_id,
        } => {
            // The chef step is advisory: the owner is only told about the
            // final decision, so no owner notification here.
            let _ = owner_id;
            vec![
                NotificationDraft {
                    recipient: Recipient::User { user_id: *actor_id },
                    message: format!(
                        "Vous avez {} la demande de {} de {}.",
                        outcome_verb_fr(*outcome),
                        category.label_fr(),
                        owner_name
                    ),
                    severity: match outcome {
                        Outcome::Approve => Severity::Success,
                        Outcome::Reject => Severity::Warning,
                    },
                    link: home_link(*request_id),
                },
                NotificationDraft {
                    recipient: Recipient::Role { role: Role::Admin },
                    message: format!(
                        "Une demande de {} de {} a été {} par le chef. En attente de votre décision finale.",
                        category.label_fr(),
                        owner_name,
                        outcome_fr(*outcome)
                    ),
                    severity: Severity::Info,
                    link: admin_link(*request_id),
                },
            ]
        }
        WorkflowEvent::Decided {
            request_id,
            category,
            owner_id,
            owner_name,
            outcome,
            tier: DecisionTier::Admin,
            actor_id,
        } => {
            let mut drafts = vec![
                NotificationDraft {
                    recipient: Recipient::User { user_id: *actor_id },
                    message: format!(
                        "Vous avez {} définitivement la demande de {} de {}.",
                        outcome_verb_fr(*outcome),
                        category.label_fr(),
                        owner_name
                    ),
                    severity: match outcome {
                        Outcome::Approve => Severity::Success,
                        Outcome::Reject => Severity::Warning,
                    },
                    link: admin_link(*request_id),
                },
                NotificationDraft {
                    recipient: Recipient::User { user_id: *owner_id },
                    message: format!(
                        "Votre demande de {} a été {} définitivement.",
                        category.label_fr(),
                        outcome_fr(*outcome)
                    ),
                    severity: match outcome {
                        Outcome::Approve => Severity::Success,
                        Outcome::Reject => Severity::Error,
                    },
                    link: home_link(*request_id),
                },
            ];
            // A final call that closes a chef-tier chain is announced to the
            // rest of the connected audience; direct-to-admin categories stay
            // between the admin and the owner.
            if category.requires_chef_step() {
                drafts.push(NotificationDraft {
                    recipient: Recipient::AllExceptRole { role: Role::Admin },
                    message: format!(
                        "La demande de {} de {} a été {} par l'administration.",
                        category.label_fr(),
                        owner_name,
                        outcome_fr(*outcome)
                    ),
                    severity: Severity::Info,
                    link: home_link(*request_id),
                });
            }
            drafts
        }
    }
}

fn outcome_verb_fr(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Approve => "approuvé",
        Outcome::Reject => "rejeté",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::requests::RequestCategory;

    fn decided(
        category: RequestCategory,
        outcome: Outcome,
        tier: DecisionTier,
        actor_id: i32,
    ) -> WorkflowEvent {
        WorkflowEvent::Decided {
            request_id: 42,
            category,
            owner_id: 10,
            owner_name: "Amina Benali".into(),
            outcome,
            tier,
            actor_id,
        }
    }

    #[test]
    fn created_leave_request_notifies_admins_and_chefs() {
        let event = WorkflowEvent::Created {
            request_id: 42,
            category: RequestCategory::Leave,
            owner_id: 10,
            owner_name: "Amina Benali".into(),
        };
        let drafts = recipients_for(&event);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].recipient, Recipient::Role { role: Role::Admin });
        assert_eq!(drafts[1].recipient, Recipient::Role { role: Role::Chef });
        assert!(drafts[0].message.contains("congé"));
    }

    #[test]
    fn created_document_request_notifies_admins_only() {
        let event = WorkflowEvent::Created {
            request_id: 7,
            category: RequestCategory::Document,
            owner_id: 10,
            owner_name: "Amina Benali".into(),
        };
        let drafts = recipients_for(&event);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].recipient, Recipient::Role { role: Role::Admin });
    }

    #[test]
    fn chef_approval_confirms_chef_and_informs_admins_but_not_owner() {
        let drafts = recipients_for(&decided(
            RequestCategory::Leave,
            Outcome::Approve,
            DecisionTier::Chef,
            3,
        ));
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].recipient, Recipient::User { user_id: 3 });
        assert_eq!(drafts[0].severity, Severity::Success);
        assert_eq!(drafts[1].recipient, Recipient::Role { role: Role::Admin });
        assert_eq!(drafts[1].severity, Severity::Info);
        assert!(!drafts
            .iter()
            .any(|d| d.recipient == Recipient::User { user_id: 10 }));
    }

    #[test]
    fn chef_rejection_uses_warning_for_self_confirmation() {
        let drafts = recipients_for(&decided(
            RequestCategory::Training,
            Outcome::Reject,
            DecisionTier::Chef,
            3,
        ));
        assert_eq!(drafts[0].severity, Severity::Warning);
        assert!(drafts[1].message.contains("rejetée"));
    }

    #[test]
    fn final_rejection_after_chef_step_fans_out_to_everyone_else() {
        // Scenario A, final step: admin rejects a chef-approved leave request.
        let drafts = recipients_for(&decided(
            RequestCategory::Leave,
            Outcome::Reject,
            DecisionTier::Admin,
            9,
        ));
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].recipient, Recipient::User { user_id: 9 });
        assert_eq!(drafts[1].recipient, Recipient::User { user_id: 10 });
        assert_eq!(drafts[1].severity, Severity::Error);
        assert!(drafts[1].message.contains("rejetée définitivement"));
        assert_eq!(
            drafts[2].recipient,
            Recipient::AllExceptRole { role: Role::Admin }
        );
    }

    #[test]
    fn direct_admin_approval_skips_the_broadcast() {
        // Scenario B: DOCUMENT has no chef audience to inform.
        let drafts = recipients_for(&decided(
            RequestCategory::Document,
            Outcome::Approve,
            DecisionTier::Admin,
            9,
        ));
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].recipient, Recipient::User { user_id: 10 });
        assert_eq!(drafts[1].severity, Severity::Success);
    }

    #[test]
    fn drafts_become_unread_notifications_with_fresh_ids() {
        let drafts = recipients_for(&decided(
            RequestCategory::Leave,
            Outcome::Approve,
            DecisionTier::Admin,
            9,
        ));
        let a = drafts[0].clone().into_notification();
        let b = drafts[1].clone().into_notification();
        assert!(!a.read);
        assert_ne!(a.id, b.id);
    }
}
