use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::platform::{Event, MessagingClient};

/// A message recorded by [`FakeClient::post_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub channel: String,
    pub text: String,
    pub as_user: bool,
}

/// In-memory client that replays scripted event batches.
///
/// Once the script runs out, `read_events` fails so the bot loop ends.
#[derive(Default)]
pub struct FakeClient {
    refuse_connect: bool,
    fail_delivery: bool,
    batches: Mutex<VecDeque<Vec<Event>>>,
    posted: Mutex<Vec<Posted>>,
}

impl FakeClient {
    pub fn with_batches(batches: Vec<Vec<Event>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            ..Self::default()
        }
    }

    /// Make the handshake fail
    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Make every post fail
    pub fn failing_delivery(mut self) -> Self {
        self.fail_delivery = true;
        self
    }

    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }

    pub fn remaining_batches(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    type Session = ();

    async fn connect(&self) -> Result<()> {
        if self.refuse_connect {
            bail!("invalid_auth");
        }
        Ok(())
    }

    async fn read_events(&self, _session: &mut ()) -> Result<Vec<Event>> {
        match self.batches.lock().unwrap().pop_front() {
            Some(batch) => Ok(batch),
            None => bail!("script exhausted"),
        }
    }

    async fn post_message(&self, channel: &str, text: &str, as_user: bool) -> Result<()> {
        if self.fail_delivery {
            bail!("channel_not_found");
        }
        self.posted.lock().unwrap().push(Posted {
            channel: channel.to_string(),
            text: text.to_string(),
            as_user,
        });
        Ok(())
    }
}
