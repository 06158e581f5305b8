use kvquorum_core::Address;

/// The simulated network, injected so a `Node` never binds to a concrete
/// I/O mechanism. Delivery is fire-and-forget from the sender's
/// perspective: `send` enqueues, and the bytes surface on some later
/// `recv(dst)` call, in send order per sender.
pub trait Transport {
    fn send(&mut self, src: Address, dst: Address, bytes: Vec<u8>);

    /// Returns and drains every frame delivered to `addr` since the last
    /// call.
    fn recv(&mut self, addr: Address) -> Vec<Vec<u8>>;
}
