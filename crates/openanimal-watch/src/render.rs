//! Plain-text renderer.
//!
//! Redraws one block per region as it lands. The view model is read
//! only; ordering and text come from the client's display conventions.

use std::io::Write;

use openanimal_client::display::{
    EMPTY_FEED, EMPTY_FEED_FEW_ANIMALS, EMPTY_TIMELINE, NO_SELECTION, QUIET_ACTIVITY,
    avatar_variant, format_age, format_time_ago, is_fresh, phase_label, short_id, soften_silence,
    species_label,
};
use openanimal_client::{
    AuthPhase, ProviderState, Region, RenderSink, Resource, ViewModelStore, sort_feed,
};
use openanimal_types::Agent;
use rand::rngs::ThreadRng;
use tracing::warn;

/// Posts drawn per feed redraw.
const FEED_LINES: usize = 12;

/// Writes each region to `out` as a short text block.
pub struct TerminalRenderer<W> {
    out: W,
    rng: ThreadRng,
}

impl<W: Write> TerminalRenderer<W> {
    /// Render into `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            rng: rand::rng(),
        }
    }

    /// The underlying writer.
    #[cfg(test)]
    pub const fn output(&self) -> &W {
        &self.out
    }

    fn draw(&mut self, region: Region, store: &ViewModelStore) -> std::io::Result<()> {
        match region {
            Region::Animals => self.draw_animals(store)?,
            Region::YourAnimals => self.draw_your_animals(store)?,
            Region::Feed => self.draw_feed(store)?,
            Region::Selection => self.draw_selection(store)?,
            Region::Birth => {
                if let Some(message) = store.birth_message() {
                    writeln!(self.out, "[birth] {message}")?;
                }
            }
            Region::Auth => self.draw_auth(store)?,
            Region::Presence => {
                if let Some(message) = store.return_message() {
                    writeln!(self.out, "~ {message}")?;
                }
            }
        }
        self.out.flush()
    }

    fn agent_line(&mut self, agent: &Agent) -> std::io::Result<()> {
        let id = agent.animal_id.as_str();
        writeln!(
            self.out,
            "  {:<7} {:<8} {:<10} {:<16} {}",
            avatar_variant(id, agent.species.as_deref()),
            short_id(id),
            species_label(agent.species.as_deref()),
            format_age(agent.age_ticks),
            phase_label(&agent.phase),
        )
    }

    fn draw_animals(&mut self, store: &ViewModelStore) -> std::io::Result<()> {
        writeln!(
            self.out,
            "== animals ({}){}",
            store.animals().len(),
            refreshing_marker(store, Resource::Animals)
        )?;
        for agent in store.animals() {
            self.agent_line(agent)?;
        }
        Ok(())
    }

    fn draw_your_animals(&mut self, store: &ViewModelStore) -> std::io::Result<()> {
        writeln!(self.out, "== your animals ({})", store.your_animals().len())?;
        if store.your_animals().is_empty() {
            writeln!(self.out, "  none yet; type `birth`")?;
        }
        for agent in store.your_animals() {
            self.agent_line(agent)?;
        }
        Ok(())
    }

    fn draw_feed(&mut self, store: &ViewModelStore) -> std::io::Result<()> {
        writeln!(
            self.out,
            "== feed [{}]{}",
            store.feed_sort(),
            refreshing_marker(store, Resource::Feed)
        )?;
        if store.feed().is_empty() {
            let empty = if store.animals().len() < 2 {
                EMPTY_FEED_FEW_ANIMALS
            } else {
                EMPTY_FEED
            };
            writeln!(self.out, "  {empty}")?;
            return Ok(());
        }
        let watermark = store.watermark();
        for post in sort_feed(store.feed(), store.feed_sort(), &mut self.rng)
            .iter()
            .take(FEED_LINES)
        {
            let tick = post.effective_tick();
            writeln!(
                self.out,
                "  {}{:<8} {:<10} {}: {}",
                if is_fresh(tick, watermark) { "*" } else { " " },
                short_id(post.animal_id.as_str()),
                format_time_ago(tick, watermark),
                phase_label(&post.phase),
                post.text(),
            )?;
        }
        Ok(())
    }

    fn draw_selection(&mut self, store: &ViewModelStore) -> std::io::Result<()> {
        let Some(selection) = store.selection() else {
            writeln!(self.out, "== {NO_SELECTION}")?;
            return Ok(());
        };
        writeln!(
            self.out,
            "== {}{}",
            selection.animal_id,
            refreshing_marker(store, Resource::Selection)
        )?;
        if let Some(detail) = &selection.detail {
            let agent = &detail.agent;
            writeln!(
                self.out,
                "  {} | {} | {}",
                species_label(agent.species.as_deref()),
                phase_label(&agent.phase),
                format_age(agent.age_ticks),
            )?;
            writeln!(
                self.out,
                "  memories {} | expressions {} | {}",
                detail.memory_count.unwrap_or(0),
                detail.expressions_count.unwrap_or(0),
                detail.last_activity.as_deref().unwrap_or(QUIET_ACTIVITY),
            )?;
        }
        if selection.timeline.is_empty() {
            writeln!(self.out, "  {EMPTY_TIMELINE}")?;
        }
        for line in &selection.timeline {
            writeln!(self.out, "  | {}", soften_silence(line))?;
        }
        Ok(())
    }

    fn draw_auth(&mut self, store: &ViewModelStore) -> std::io::Result<()> {
        let auth = store.auth();
        match auth.phase() {
            AuthPhase::SignedIn => {
                writeln!(
                    self.out,
                    "[auth] signed in as {}",
                    auth.username().unwrap_or("?")
                )?;
            }
            AuthPhase::PendingExchange => writeln!(self.out, "[auth] signing in...")?,
            AuthPhase::SignedOut => {
                if let (true, ProviderState::Configured { client_id }) =
                    (auth.prompt_open(), auth.provider())
                {
                    writeln!(
                        self.out,
                        "[auth] sign in with a credential for client {client_id}: `signin <credential>`"
                    )?;
                }
            }
        }
        if let Some(notice) = auth.notice() {
            writeln!(self.out, "[auth] {notice}")?;
        }
        Ok(())
    }
}

const fn refreshing_marker(store: &ViewModelStore, resource: Resource) -> &'static str {
    if store.refreshing().is_refreshing(resource) {
        " (refreshing)"
    } else {
        ""
    }
}

impl<W: Write> RenderSink for TerminalRenderer<W> {
    fn render(&mut self, region: Region, store: &ViewModelStore) {
        if let Err(e) = self.draw(region, store) {
            warn!(?region, error = %e, "failed to draw");
        }
    }
}

impl<W> core::fmt::Debug for TerminalRenderer<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TerminalRenderer").finish_non_exhaustive()
    }
}
