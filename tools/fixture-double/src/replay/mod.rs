//! Record-and-replay of HTTP interactions against on-disk fixtures.
//!
//! # Overview
//!
//! A test hands its client an [`router::InteractionRouter`] in place of the
//! real transport:
//! 1. **Record** – each request goes to the real service; request and
//!    response are written, secrets swapped for placeholders, under a
//!    directory named after the request's fingerprint.
//! 2. **Replay** – the same fingerprint is recomputed and the stored
//!    response is returned with the current run's secrets put back.
//!    A request that was never recorded is an error, never a guess.

pub mod recording;
pub mod router;
