use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use facewatch_core::gallery::domain::gallery_client::GalleryClient;
use facewatch_core::gallery::domain::person::Person;
use facewatch_core::pipeline::person_gallery::{DeleteOutcome, PersonGallery};

const LOAD_FALLBACK: &str = "Error loading persons.";

pub enum GalleryRequest {
    Refresh,
    Enroll { name: String, image: Option<PathBuf> },
    /// Sent only after the user has confirmed the deletion.
    Delete { id: i64, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    Persons(Vec<Person>),
    LoadFailed(String),
    Enrolled(String),
    EnrollFailed(String),
    Deleted(String),
    DeleteFailed(String),
}

/// Runs gallery calls off the UI thread. Requests are served in order by a
/// single thread that owns the [`PersonGallery`].
pub struct GalleryWorker {
    requests: Sender<GalleryRequest>,
    events: Receiver<GalleryEvent>,
}

impl GalleryWorker {
    pub fn spawn(client: Box<dyn GalleryClient>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<GalleryRequest>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<GalleryEvent>();

        thread::spawn(move || {
            let mut gallery = PersonGallery::new(client);
            for request in request_rx {
                for event in serve(&mut gallery, request) {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
            log::debug!("Gallery worker stopped");
        });

        Self {
            requests: request_tx,
            events: event_rx,
        }
    }

    pub fn send(&self, request: GalleryRequest) {
        if self.requests.send(request).is_err() {
            log::warn!("Gallery worker is gone; request dropped");
        }
    }

    pub fn events(&self) -> &Receiver<GalleryEvent> {
        &self.events
    }

    pub fn drain(&self) -> Vec<GalleryEvent> {
        self.events().try_iter().collect()
    }
}

fn serve(gallery: &mut PersonGallery, request: GalleryRequest) -> Vec<GalleryEvent> {
    match request {
        GalleryRequest::Refresh => match gallery.refresh() {
            Ok(persons) => vec![GalleryEvent::Persons(persons.to_vec())],
            Err(e) => vec![GalleryEvent::LoadFailed(e.user_message(LOAD_FALLBACK))],
        },
        GalleryRequest::Enroll { name, image } => {
            gallery.form.name = name;
            gallery.form.image = image;
            match gallery.enroll() {
                Ok(message) => vec![
                    GalleryEvent::Enrolled(message),
                    GalleryEvent::Persons(gallery.persons().to_vec()),
                ],
                Err(e) => vec![GalleryEvent::EnrollFailed(e.to_string())],
            }
        }
        GalleryRequest::Delete { id, name } => match gallery.delete(id, &name, |_| true) {
            Ok(DeleteOutcome::Deleted(message)) => vec![
                GalleryEvent::Deleted(message),
                GalleryEvent::Persons(gallery.persons().to_vec()),
            ],
            Ok(DeleteOutcome::Cancelled) => Vec::new(),
            Err(e) => vec![GalleryEvent::DeleteFailed(e.to_string())],
        },
    }
}
