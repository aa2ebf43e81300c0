//! Declarative wire codec.
//!
//! Every payload exchanged with the mote is a fixed sequence of big-endian
//! fields, optionally followed by a variable-length tail. [`WireField`] encodes
//! and decodes one field; [`wire_record!`](crate::wire_record) derives the codec
//! for a whole record from its field list, so a layout is written down once and
//! used in both directions.

pub use bytes::{Buf, BufMut};

/// A value with a fixed big-endian wire representation.
pub trait WireField: Sized {
    /// Number of bytes this value occupies on the wire. For records ending in
    /// a variable tail this is the minimum length.
    const WIRE_LEN: usize;

    /// Append the encoded value to `buf`.
    fn put<B: BufMut>(&self, buf: &mut B);

    /// Decode a value from the front of `buf`, or `None` if too few bytes remain.
    fn get<B: Buf>(buf: &mut B) -> Option<Self>;

    /// Encode into a fresh vector.
    fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_LEN);
        self.put(&mut out);
        out
    }

    /// Decode from a byte slice. Trailing bytes are ignored unless the record
    /// ends in a variable tail, which absorbs them.
    fn from_wire(mut data: &[u8]) -> Option<Self> {
        Self::get(&mut data)
    }
}

impl WireField for u8 {
    const WIRE_LEN: usize = 1;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(*self);
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        (buf.remaining() >= 1).then(|| buf.get_u8())
    }
}

impl WireField for i8 {
    const WIRE_LEN: usize = 1;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_i8(*self);
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        (buf.remaining() >= 1).then(|| buf.get_i8())
    }
}

impl WireField for bool {
    const WIRE_LEN: usize = 1;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        (buf.remaining() >= 1).then(|| buf.get_u8() != 0)
    }
}

impl WireField for u16 {
    const WIRE_LEN: usize = 2;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(*self);
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        (buf.remaining() >= 2).then(|| buf.get_u16())
    }
}

impl WireField for u32 {
    const WIRE_LEN: usize = 4;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(*self);
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        (buf.remaining() >= 4).then(|| buf.get_u32())
    }
}

impl<T: WireField + Default, const N: usize> WireField for [T; N] {
    const WIRE_LEN: usize = T::WIRE_LEN * N;

    fn put<B: BufMut>(&self, buf: &mut B) {
        for item in self {
            item.put(buf);
        }
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        if buf.remaining() < Self::WIRE_LEN {
            return None;
        }
        let mut complete = true;
        let items = std::array::from_fn(|_| {
            T::get(buf).unwrap_or_else(|| {
                complete = false;
                T::default()
            })
        });
        complete.then_some(items)
    }
}

/// Variable-length tail. Only valid as the last field of a record.
impl WireField for Vec<u8> {
    const WIRE_LEN: usize = 0;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self);
    }

    fn get<B: Buf>(buf: &mut B) -> Option<Self> {
        let mut tail = vec![0u8; buf.remaining()];
        buf.copy_to_slice(&mut tail);
        Some(tail)
    }
}

/// Declares a wire record: a plain struct plus its [`WireField`] codec.
///
/// Fields are encoded in declaration order.
///
/// ```
/// ipmt_link::wire_record! {
///     /// Two counters.
///     pub struct Counters {
///         pub ok: u16,
///         pub failed: u16,
///     }
/// }
///
/// use ipmt_link::WireField;
/// assert_eq!(Counters::WIRE_LEN, 4);
/// let c = Counters::from_wire(&[0, 1, 0, 2]).unwrap();
/// assert_eq!((c.ok, c.failed), (1, 2));
/// ```
#[macro_export]
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $crate::wire::WireField for $name {
            const WIRE_LEN: usize = 0 $( + <$ty as $crate::wire::WireField>::WIRE_LEN )*;

            #[allow(unused_variables)]
            fn put<B: $crate::wire::BufMut>(&self, buf: &mut B) {
                $( $crate::wire::WireField::put(&self.$field, buf); )*
            }

            #[allow(unused_variables)]
            fn get<B: $crate::wire::Buf>(buf: &mut B) -> Option<Self> {
                Some($name {
                    $( $field: <$ty as $crate::wire::WireField>::get(buf)?, )*
                })
            }
        }
    };
}
