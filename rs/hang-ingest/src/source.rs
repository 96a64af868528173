use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::decode::Backend;
use crate::{CodecDescriptor, Config, EncodedChunk, Error, FrameQueue, Pipeline, Sink, TimestampTracker};

/// The decode side of one video subscription.
///
/// The session layer calls into this from its own threads: [Self::on_catalog] when the track
/// configuration arrives and [Self::on_video_chunk] for every chunk, while the host may call
/// [Self::deactivate] at any time. Frames are handed to the [Sink] after the decoder lock is
/// released, so a slow sink never blocks teardown.
pub struct Source<B: Backend, S: Sink> {
	backend: B,
	sink: S,
	config: Config,

	// Checked without the lock to reject chunks early, and again under it.
	active: AtomicBool,

	// At most one decoder generation; only touched while locked.
	decoder: Mutex<Option<Pipeline<B::Decoder>>>,

	// Shared with the pipeline so it survives codec changes.
	timestamps: Arc<TimestampTracker>,
}

impl<B: Backend> Source<B, Arc<FrameQueue>> {
	/// Create a source that queues frames for a polling consumer.
	pub fn with_queue(backend: B, config: Config) -> Self {
		let queue = Arc::new(FrameQueue::new(config.queue_capacity));
		Self::new(backend, queue, config)
	}
}

impl<B: Backend, S: Sink> Source<B, S> {
	/// Create an inactive source.
	pub fn new(backend: B, sink: S, config: Config) -> Self {
		Self {
			backend,
			sink,
			config,
			active: AtomicBool::new(false),
			decoder: Mutex::new(None),
			timestamps: Arc::new(TimestampTracker::new()),
		}
	}

	/// Start accepting catalogs and chunks.
	///
	/// Returns false if the source was already active.
	pub fn activate(&self) -> bool {
		let activated = !self.active.swap(true, Ordering::SeqCst);
		if activated {
			tracing::info!("video source activated");
		}
		activated
	}

	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::SeqCst)
	}

	/// Configure the decoder for a new codec string and description.
	///
	/// The previous decoder is destroyed first. Nothing happens if the configuration is unchanged.
	/// If the decoder can't be opened, the source is deactivated.
	pub fn on_catalog(&self, codec: &str, description: Option<&[u8]>) -> Result<(), Error> {
		let descriptor = CodecDescriptor::new(codec, description.map(Bytes::copy_from_slice));
		self.configure(descriptor)
	}

	/// Like [Self::on_catalog], but extracts the first video rendition from a hang catalog.
	pub fn on_catalog_json(&self, json: &str) -> Result<(), Error> {
		if !self.is_active() {
			return Err(Error::Inactive);
		}

		let catalog: Catalog = json.parse()?;
		self.configure(catalog.descriptor())
	}

	fn configure(&self, descriptor: CodecDescriptor) -> Result<(), Error> {
		if !self.is_active() {
			return Err(Error::Inactive);
		}

		let mut decoder = self.decoder.lock();

		// Deactivated while we were waiting for the lock.
		if !self.is_active() {
			return Err(Error::Inactive);
		}

		if decoder.as_ref().is_some_and(|pipeline| pipeline.codec() == &descriptor) {
			tracing::debug!(codec = %descriptor, "codec unchanged, keeping decoder");
			return Ok(());
		}

		// Never let two decoders coexist.
		if let Some(mut old) = decoder.take() {
			old.destroy();
		}

		let pipeline = Pipeline::init(
			&self.backend,
			descriptor,
			self.timestamps.clone(),
			self.config.decode.clone(),
		)
		.inspect_err(|err| {
			tracing::error!(%err, "failed to initialize decoder, deactivating");
			self.active.store(false, Ordering::SeqCst);
		})?;

		*decoder = Some(pipeline);

		Ok(())
	}

	/// Decode a chunk and deliver the resulting frames to the sink.
	///
	/// Returns the number of frames delivered. If the decoder reported an error part way through,
	/// the frames before it are still delivered and the error is returned afterwards.
	pub fn on_video_chunk(&self, chunk: EncodedChunk) -> Result<usize, Error> {
		if !self.is_active() {
			return Err(Error::Inactive);
		}

		let (decoded, live) = {
			let mut decoder = self.decoder.lock();

			if !self.is_active() {
				return Err(Error::Inactive);
			}

			let pipeline = decoder.as_mut().ok_or(Error::NoDecoder)?;
			let decoded = pipeline.decode(&chunk)?;

			(decoded, self.is_active())
		};

		// Release the encoded chunk before handing off frames.
		drop(chunk);

		if !live {
			tracing::debug!(frames = decoded.frames.len(), "source deactivated, dropping frames");
			return Ok(0);
		}

		let count = decoded.frames.len();
		for frame in decoded.frames {
			self.sink.output(frame);
		}

		match decoded.error {
			Some(err) => Err(err.into()),
			None => Ok(count),
		}
	}

	/// Stop accepting chunks, clear any queued frames and destroy the decoder.
	///
	/// Safe to call repeatedly and from any thread; waits for an in-flight decode to finish.
	pub fn deactivate(&self) {
		if self.active.swap(false, Ordering::SeqCst) {
			tracing::info!("video source deactivated");
		}

		// Queued frames are released before the decoder that produced them.
		self.sink.clear();

		let mut decoder = self.decoder.lock();

		// Reset while locked, otherwise a new session could start before the reset lands.
		self.timestamps.reset();

		if let Some(mut pipeline) = decoder.take() {
			pipeline.destroy();
		}
	}

	/// The codec of the current decoder, if any.
	pub fn codec(&self) -> Option<CodecDescriptor> {
		self.decoder.lock().as_ref().map(|pipeline| pipeline.codec().clone())
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn timestamps(&self) -> &TimestampTracker {
		&self.timestamps
	}
}

impl<B: Backend, S: Sink> Drop for Source<B, S> {
	fn drop(&mut self) {
		self.deactivate();
	}
}
