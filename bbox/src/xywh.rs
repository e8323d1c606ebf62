use super::Rect;
use crate::common::*;

/// Bounding box in the COCO `[x, y, w, h]` layout.
///
/// It is serialized as a plain four-element array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "[T; 4]",
    into = "[T; 4]",
    bound(
        serialize = "T: Clone + Serialize",
        deserialize = "T: Num + PartialOrd + Copy + Deserialize<'de>"
    )
)]
pub struct XYWH<T> {
    pub(crate) x: T,
    pub(crate) y: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> XYWH<T> {
    pub fn try_cast<V>(self) -> Option<XYWH<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(XYWH {
            x: V::from(self.x)?,
            y: V::from(self.y)?,
            w: V::from(self.w)?,
            h: V::from(self.h)?,
        })
    }

    pub fn cast<V>(self) -> XYWH<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> Rect for XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x(&self) -> Self::Type {
        self.x
    }

    fn y(&self) -> Self::Type {
        self.y
    }

    fn w(&self) -> Self::Type {
        self.w
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self> {
        let [x, y, w, h] = xywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");
        Ok(Self { x, y, w, h })
    }
}

impl<T> TryFrom<[T; 4]> for XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    type Error = Error;

    fn try_from(xywh: [T; 4]) -> Result<Self, Self::Error> {
        Self::try_from_xywh(xywh)
    }
}

impl<T> From<XYWH<T>> for [T; 4] {
    fn from(from: XYWH<T>) -> Self {
        let XYWH { x, y, w, h } = from;
        [x, y, w, h]
    }
}
