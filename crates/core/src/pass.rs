/// A compilation stage, consumed by running it so no stage state outlives its output
pub trait Pass<I>
where
  I: ?Sized,
{
  type Output;
  type Error;

  /// Run the stage over its input
  ///
  /// # Errors
  ///
  /// Returns the stage error for input the stage cannot handle
  fn run(self, input: &I) -> Result<Self::Output, Self::Error>;
}

// `input.accept(stage)` reads in pipeline order
pub trait Acceptor {
  fn accept<P>(&self, pass: P) -> Result<P::Output, P::Error>
  where
    P: Pass<Self>,
  {
    pass.run(self)
  }
}

impl<T> Acceptor for T where T: ?Sized {}
