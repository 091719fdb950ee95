use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::state::ForceGraphState;

type Canceller = Box<dyn FnOnce()>;

/// Owns one mounted graph and every callback scheduled against it.
///
/// Animation frames, timers and listeners register a canceller with
/// [`GraphSession::on_unmount`]; [`GraphSession::unmount`] stops the
/// simulation, drops the state and runs the cancellers, so a callback that
/// still fires afterwards finds nothing to mutate.
#[derive(Clone, Default)]
pub struct GraphSession {
	state: Rc<RefCell<Option<ForceGraphState>>>,
	cancellers: Rc<RefCell<Vec<Canceller>>>,
}

impl GraphSession {
	/// Replace any mounted graph with `state`.
	pub fn mount(&self, state: ForceGraphState) {
		self.unmount();
		*self.state.borrow_mut() = Some(state);
	}

	pub fn unmount(&self) -> bool {
		let previous = self.state.borrow_mut().take();
		let mounted = previous.is_some();
		if let Some(mut state) = previous {
			state.stop();
			debug!("Tore down fund-flow graph ({} nodes)", state.nodes.len());
		}
		let cancellers = std::mem::take(&mut *self.cancellers.borrow_mut());
		for cancel in cancellers {
			cancel();
		}
		mounted
	}

	pub fn is_mounted(&self) -> bool {
		self.state.borrow().is_some()
	}

	pub fn on_unmount(&self, cancel: impl FnOnce() + 'static) {
		self.cancellers.borrow_mut().push(Box::new(cancel));
	}

	/// Run `f` against the mounted state, if any.
	pub fn with<R>(&self, f: impl FnOnce(&mut ForceGraphState) -> R) -> Option<R> {
		self.state.borrow_mut().as_mut().map(f)
	}
}
