use kvquorum_core::Address;

/// One member's position on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingNode {
    pub address: Address,
    pub hash: u64,
}

/// A consistent-hash projection of a `MemberList`, sorted ascending by
/// hash with ties broken by `(id, port)`.
///
/// There are no virtual nodes: one ring position per member.
#[derive(Debug, Clone, Default)]
pub struct Ring {
    nodes: Vec<RingNode>,
}

impl Ring {
    /// Hashes `address`'s `"id:port"` form with MurmurHash3 and reduces it
    /// mod `ring_size`.
    pub fn hash_address(address: Address, ring_size: u64) -> u64 {
        hash_bytes(&address.hash_bytes(), ring_size)
    }

    /// Hashes an arbitrary key the same way, for `find_nodes`.
    pub fn hash_key(key: &str, ring_size: u64) -> u64 {
        hash_bytes(key.as_bytes(), ring_size)
    }

    pub fn build(members: impl IntoIterator<Item = Address>, ring_size: u64) -> Self {
        let mut nodes: Vec<RingNode> = members
            .into_iter()
            .map(|address| RingNode {
                address,
                hash: Self::hash_address(address, ring_size),
            })
            .collect();
        nodes.sort_by_key(|n| (n.hash, n.address));
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[RingNode] {
        &self.nodes
    }

    /// The ordered hashes of every ring member; two rings with the same
    /// multiset of hashes (in this sorted, deduplicated-by-construction
    /// form) are considered unchanged by the stabilizer.
    pub fn hashes(&self) -> Vec<u64> {
        self.nodes.iter().map(|n| n.hash).collect()
    }

    /// Returns the `replica_count` consecutive ring positions starting at
    /// the first node whose hash is `>= H(key)`, wrapping around. Returns
    /// an empty vec if the ring has fewer than `replica_count` members —
    /// callers must treat that as "operation rejected, no network I/O".
    pub fn find_nodes(&self, key: &str, ring_size: u64, replica_count: usize) -> Vec<Address> {
        if self.nodes.len() < replica_count {
            return Vec::new();
        }
        let key_hash = Self::hash_key(key, ring_size);
        let start = self
            .nodes
            .partition_point(|n| n.hash < key_hash)
            % self.nodes.len();
        (0..replica_count)
            .map(|i| self.nodes[(start + i) % self.nodes.len()].address)
            .collect()
    }

    /// The position of `address` in ring order, if present.
    pub fn position_of(&self, address: Address) -> Option<usize> {
        self.nodes.iter().position(|n| n.address == address)
    }

    /// The two ring successors of `address` — the nodes that should hold
    /// `address`'s primary replicas (`hasMyReplicas`).
    pub fn successors(&self, address: Address, count: usize) -> Vec<Address> {
        self.neighbors(address, count, 1)
    }

    /// The two ring predecessors of `address` — the nodes whose primary
    /// replicas `address` mirrors (`haveReplicasOf`).
    pub fn predecessors(&self, address: Address, count: usize) -> Vec<Address> {
        self.neighbors(address, count, -1)
    }

    fn neighbors(&self, address: Address, count: usize, step: isize) -> Vec<Address> {
        let Some(pos) = self.position_of(address) else {
            return Vec::new();
        };
        let len = self.nodes.len() as isize;
        if len <= 1 {
            return Vec::new();
        }
        (1..=count as isize)
            .map(|i| {
                let idx = (pos as isize + step * i).rem_euclid(len) as usize;
                self.nodes[idx].address
            })
            .filter(|a| *a != address)
            .collect()
    }
}

fn hash_bytes(bytes: &[u8], ring_size: u64) -> u64 {
    let digest = mur3::murmurhash3_x86_32(&mut &bytes[..], 0);
    (digest as u64) % ring_size
}
