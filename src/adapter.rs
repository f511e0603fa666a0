use crate::config::Config;
use crate::constants::MAX_PUMPED_EVENTS;
use crate::event::{Directive, EventSource, WmEvent};
use crate::host::{Host, HostId};
use crate::policy::PolicyEngine;

/// Glue between a host and the policy engine.
///
/// This is the only place directives touch the host. Applying a directive
/// normally makes the host queue a follow-up notification; [`Self::pump`]
/// feeds those back into the engine one at a time until the host is quiet.
pub struct EventAdapter<H: Host> {
    host: H,
    engine: PolicyEngine<HostId<H>>,
}

impl<H: Host> EventAdapter<H> {
    pub fn new(host: H, config: Config) -> Self {
        Self {
            host,
            engine: PolicyEngine::new(config),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &PolicyEngine<HostId<H>> {
        &self.engine
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Take over windows that were open before the adapter existed, then
    /// evaluate around whatever the host has active.
    pub fn start(&mut self) -> Vec<Directive<HostId<H>>> {
        self.engine.adopt(&self.host);
        match self.host.active_window() {
            Some(active) => self.dispatch(WmEvent::Activated(active)),
            None => self.dispatch(WmEvent::Relayouted),
        }
    }

    /// Evaluate one event and apply the resulting directives.
    pub fn dispatch(&mut self, event: WmEvent<HostId<H>>) -> Vec<Directive<HostId<H>>> {
        let directives = self.engine.handle(&self.host, event);
        for directive in &directives {
            self.apply(*directive);
        }
        directives
    }

    fn apply(&mut self, directive: Directive<HostId<H>>) {
        tracing::debug!(%directive, "applying");
        match directive {
            Directive::Minimize(id) => self.host.set_minimized(id, true),
            Directive::Restore(id) => self.host.set_minimized(id, false),
            Directive::Activate(id) => self.host.set_active(id),
        }
    }
}

impl<H> EventAdapter<H>
where
    H: Host + EventSource<HostId<H>>,
{
    /// Drain the host's notification queue through the engine. Returns every
    /// directive applied, in order.
    pub fn pump(&mut self) -> Vec<Directive<HostId<H>>> {
        let mut applied = Vec::new();
        for _ in 0..MAX_PUMPED_EVENTS {
            let Some(event) = self.host.next_event() else {
                return applied;
            };
            applied.extend(self.dispatch(event));
        }
        tracing::warn!(
            limit = MAX_PUMPED_EVENTS,
            "host keeps emitting notifications, stopping pump"
        );
        applied
    }
}
