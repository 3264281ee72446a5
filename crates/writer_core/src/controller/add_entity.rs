use client_core::ClientError;
use shared::protocol::{EntityAck, EntityAddRequest};

use super::{Settled, Submission};
use crate::{
    call::RemoteCall,
    dialog::DialogEpoch,
    failure::ClassifiedFailure,
    operation::{Operation, OperationPhase, OperationState, Ticket, Workflow},
};

pub const MISSING_NAME_MESSAGE: &str = "Entity name is required";
pub const MISSING_DESCRIPTION_MESSAGE: &str = "Entity description is required";
pub const ADDED_MESSAGE: &str = "Entity added successfully!";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityForm {
    pub name: String,
    pub description: String,
    pub relations: String,
    pub history: String,
}

impl EntityForm {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.relations.is_empty()
            && self.history.is_empty()
    }

    fn to_request(&self) -> EntityAddRequest {
        EntityAddRequest {
            entity: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            key_relations: self.relations.clone(),
            history: self.history.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddEntityController {
    op: Operation<EntityAck>,
    form: EntityForm,
}

impl Default for AddEntityController {
    fn default() -> Self {
        Self {
            op: Operation::new(Workflow::AddEntity),
            form: EntityForm::default(),
        }
    }
}

impl AddEntityController {
    pub fn state(&self) -> &OperationState<EntityAck> {
        self.op.state()
    }

    pub fn form(&self) -> &EntityForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntityForm {
        &mut self.form
    }

    pub fn begin(&mut self, epoch: DialogEpoch) -> Submission {
        if self.op.phase() == OperationPhase::Pending {
            return Submission::Ignored;
        }
        if self.form.name.trim().is_empty() {
            return self.reject(MISSING_NAME_MESSAGE);
        }
        if self.form.description.trim().is_empty() {
            return self.reject(MISSING_DESCRIPTION_MESSAGE);
        }
        let Some(seq) = self.op.submit() else {
            return Submission::Ignored;
        };
        let request = self.form.to_request();
        tracing::info!(workflow = "add_entity", entity = %request.entity, "adding entity");
        Submission::Dispatched(RemoteCall::AddEntity {
            ticket: Ticket {
                workflow: Workflow::AddEntity,
                seq,
                epoch: Some(epoch),
            },
            request,
        })
    }

    fn reject(&mut self, message: &str) -> Submission {
        let failure = ClassifiedFailure::validation(message);
        self.op.invalid(failure.clone());
        Submission::Rejected(failure)
    }

    /// On success the form is cleared; on failure it is kept for another attempt.
    pub fn complete(&mut self, seq: u64, result: Result<EntityAck, ClientError>) -> Settled {
        match result {
            Ok(ack) => {
                if !self.op.resolve(seq, ack) {
                    return Settled::Stale;
                }
                self.form = EntityForm::default();
                Settled::Succeeded(ADDED_MESSAGE.to_string())
            }
            Err(err) => {
                let failure = ClassifiedFailure::from_client_error(&err);
                if !self.op.fail(seq, failure.clone()) {
                    return Settled::Stale;
                }
                Settled::Failed(failure)
            }
        }
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.op.phase() == OperationPhase::Error && self.op.dismiss()
    }

    pub fn reset(&mut self) {
        self.op.abandon();
        self.form = EntityForm::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> EntityForm {
        EntityForm {
            name: "Balasar".to_string(),
            description: "Chieftain of the Daedendrainn clan".to_string(),
            relations: "Brother of Shedinn".to_string(),
            history: "Named his greatsword Javok".to_string(),
        }
    }

    #[test]
    fn name_and_description_are_required_locally() {
        let mut controller = AddEntityController::default();
        controller.form_mut().description = "desc".to_string();
        assert_eq!(
            controller.begin(DialogEpoch(1)),
            Submission::Rejected(ClassifiedFailure::validation(MISSING_NAME_MESSAGE))
        );

        *controller.form_mut() = EntityForm {
            name: "Balasar".to_string(),
            ..Default::default()
        };
        assert_eq!(
            controller.begin(DialogEpoch(1)),
            Submission::Rejected(ClassifiedFailure::validation(MISSING_DESCRIPTION_MESSAGE))
        );
    }

    #[test]
    fn success_clears_all_four_fields() {
        let mut controller = AddEntityController::default();
        *controller.form_mut() = filled();
        let Submission::Dispatched(call) = controller.begin(DialogEpoch(1)) else {
            panic!("expected dispatch");
        };
        let RemoteCall::AddEntity { ticket, request } = call else {
            panic!("unexpected call");
        };
        assert_eq!(request.key_relations, "Brother of Shedinn");

        let settled = controller.complete(ticket.seq, Ok(EntityAck::default()));

        assert_eq!(settled, Settled::Succeeded(ADDED_MESSAGE.to_string()));
        assert_eq!(controller.form(), &EntityForm::default());
        assert!(controller.form().is_empty());
    }

    #[test]
    fn failure_keeps_form_and_can_be_dismissed() {
        let mut controller = AddEntityController::default();
        *controller.form_mut() = filled();
        let Submission::Dispatched(call) = controller.begin(DialogEpoch(1)) else {
            panic!("expected dispatch");
        };

        let settled = controller.complete(
            call.ticket().seq,
            Err(ClientError::Status {
                status: 503,
                detail: Some("ChromaDB service unavailable".to_string()),
            }),
        );

        assert!(matches!(settled, Settled::Failed(_)));
        assert_eq!(controller.form(), &filled());
        assert!(controller.dismiss_error());
        assert_eq!(controller.state().phase(), OperationPhase::Idle);
    }
}
