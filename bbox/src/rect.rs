use crate::{common::*, RoundTo, HW, XYWH};

/// The generic rectangle with a top-left origin.
pub trait Rect {
    type Type;

    /// The left edge.
    fn x(&self) -> Self::Type;
    /// The top edge.
    fn y(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd + Copy,
{
    fn from_xywh(xywh: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xywh(xywh).unwrap()
    }

    fn xywh(&self) -> [Self::Type; 4] {
        [self.x(), self.y(), self.w(), self.h()]
    }

    /// The right edge.
    fn r(&self) -> Self::Type {
        self.x() + self.w()
    }

    /// The bottom edge.
    fn b(&self) -> Self::Type {
        self.y() + self.h()
    }

    fn to_xywh(&self) -> XYWH<Self::Type> {
        XYWH {
            x: self.x(),
            y: self.y(),
            w: self.w(),
            h: self.h(),
        }
    }

    fn area(&self) -> Self::Type {
        self.h() * self.w()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Express the rectangle in fractions of the image size.
    ///
    /// Horizontal components are divided by the image width and vertical ones
    /// by the image height. Returns `None` on an empty image size.
    fn to_relative(&self, size: &HW<Self::Type>) -> Option<XYWH<Self::Type>> {
        let zero = Self::Type::zero();
        let (img_h, img_w) = (size.h(), size.w());
        if !(img_h > zero && img_w > zero) {
            return None;
        }

        Some(XYWH {
            x: self.x() / img_w,
            y: self.y() / img_h,
            w: self.w() / img_w,
            h: self.h() / img_h,
        })
    }

    /// Round every component to `decimals` places.
    fn rounded(&self, decimals: i32) -> XYWH<Self::Type> {
        XYWH {
            x: self.x().round_to(decimals),
            y: self.y().round_to(decimals),
            w: self.w().round_to(decimals),
            h: self.h().round_to(decimals),
        }
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd + Copy,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_edges() {
        let rect = XYWH::from_xywh([10.0, 20.0, 30.0, 40.0]);
        assert_abs_diff_eq!(rect.r(), 40.0);
        assert_abs_diff_eq!(rect.b(), 60.0);
        assert_abs_diff_eq!(rect.area(), 1200.0);
    }

    #[test]
    fn rect_to_relative() {
        let size = HW::from_hw([1080.0, 1920.0]);
        let rect = XYWH::from_xywh([960.0, 270.0, 192.0, 540.0]);
        let rel = rect.to_relative(&size).unwrap();
        assert_abs_diff_eq!(rel.x(), 0.5);
        assert_abs_diff_eq!(rel.y(), 0.25);
        assert_abs_diff_eq!(rel.w(), 0.1);
        assert_abs_diff_eq!(rel.h(), 0.5);
    }

    #[test]
    fn rect_to_relative_empty_size() {
        let size = HW::from_hw([0.0, 1920.0]);
        let rect = XYWH::from_xywh([1.0, 2.0, 3.0, 4.0]);
        assert!(rect.to_relative(&size).is_none());
    }

    #[test]
    fn rect_round() {
        let rect = XYWH::from_xywh([1.0 / 3.0, 2.0 / 3.0, 0.123449, 0.99996]);
        let [x, y, w, h] = rect.rounded(4).xywh();
        assert_abs_diff_eq!(x, 0.3333);
        assert_abs_diff_eq!(y, 0.6667);
        assert_abs_diff_eq!(w, 0.1234);
        assert_abs_diff_eq!(h, 1.0);
    }
}
